//! Output root preparation ahead of a sweep.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;
use wta_core::errors::{ErrorInfo, SweepError};

/// Outcome of clearing an output root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Children removed from the root.
    pub removed: Vec<PathBuf>,
    /// Children that could not be removed, with the reason.
    pub failures: Vec<CleanupFailure>,
}

/// A child the clear could not remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub reason: String,
}

fn workspace_error(code: &str, root: &Path, message: impl Into<String>) -> SweepError {
    SweepError::Workspace(
        ErrorInfo::new(code, message).with_context("root", root.display().to_string()),
    )
}

/// Returns true when `ancestor` is `path` or one of its parents.
fn contains(ancestor: &Path, path: &Path) -> bool {
    match (ancestor.canonicalize(), path.canonicalize()) {
        (Ok(ancestor), Ok(path)) => path.starts_with(ancestor),
        _ => false,
    }
}

pub(crate) fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Deletes every direct child of `root`. Symlinks are unlinked, never
/// followed. A child that cannot be removed is logged and skipped.
///
/// `protected` lists paths that must survive the clear; a root that is one of
/// them or contains one of them is refused. A missing root is created.
pub fn clear_output_root(root: &Path, protected: &[&Path]) -> Result<CleanupReport, SweepError> {
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    if root.parent().is_none() || resolved.parent().is_none() {
        return Err(workspace_error(
            "unsafe_output_root",
            root,
            "refusing to clear a filesystem root",
        ));
    }
    if let Some(guarded) = protected.iter().find(|guarded| contains(root, guarded)) {
        return Err(SweepError::Workspace(
            ErrorInfo::new("unsafe_output_root", "output root contains a protected path")
                .with_context("root", root.display().to_string())
                .with_context("protected", guarded.display().to_string())
                .with_hint("point paths.output_root at a dedicated directory"),
        ));
    }
    if !root.exists() {
        fs::create_dir_all(root)
            .map_err(|err| workspace_error("output_root_create", root, err.to_string()))?;
        return Ok(CleanupReport::default());
    }
    clear_children(root, remove_entry)
}

fn clear_children<F>(root: &Path, mut remove: F) -> Result<CleanupReport, SweepError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut report = CleanupReport::default();
    let children = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for child in children {
        let child = match child {
            Ok(child) => child,
            Err(err) if err.depth() == 0 => {
                return Err(workspace_error("output_root_read", root, err.to_string()))
            }
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), error = %err, "failed to inspect output entry");
                report.failures.push(CleanupFailure {
                    path,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let path = child.into_path();
        match remove(&path) {
            Ok(()) => report.removed.push(path),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to delete output entry");
                report.failures.push(CleanupFailure {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }
    info!(
        root = %root.display(),
        removed = report.removed.len(),
        failed = report.failures.len(),
        "cleared output root"
    );
    Ok(report)
}
