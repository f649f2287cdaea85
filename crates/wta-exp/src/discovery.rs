use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;
use wta_core::errors::{ErrorInfo, SweepError};

use crate::naming::validate_component;

/// Case-insensitive selection of trace directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFilter {
    /// Substring a trace name must contain.
    pub filter: String,
    /// Substrings that drop a trace even when it matches `filter`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TraceFilter {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            exclude: Vec::new(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        name.contains(&self.filter.to_lowercase())
            && !self
                .exclude
                .iter()
                .any(|pattern| name.contains(&pattern.to_lowercase()))
    }
}

fn discovery_error(code: &str, root: &Path, err: impl ToString) -> SweepError {
    SweepError::Discovery(
        ErrorInfo::new(code, err.to_string()).with_context("root", root.display().to_string()),
    )
}

/// Lists the immediate subdirectories of `root` accepted by `filter`, sorted
/// by name. Nothing below the first level is visited.
pub fn discover_traces(root: &Path, filter: &TraceFilter) -> Result<Vec<String>, SweepError> {
    if !root.is_dir() {
        return Err(SweepError::Discovery(
            ErrorInfo::new("trace_root_missing", "trace root is not a directory")
                .with_context("root", root.display().to_string())
                .with_hint("check paths.trace_root in the plan"),
        ));
    }
    let mut traces = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(discovery_error("trace_root_read", root, err)),
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable trace entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            warn!(entry = %entry.path().display(), "skipping trace directory with non UTF-8 name");
            continue;
        };
        if !filter.matches(name) {
            debug!(trace = name, "trace filtered out");
            continue;
        }
        if let Err(err) = validate_component("trace", name) {
            warn!(trace = %name.escape_debug(), error = %err, "skipping trace whose name cannot be used in run names");
            continue;
        }
        traces.push(name.to_string());
    }
    Ok(traces)
}
