//! Deciding whether a run already completed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wta_core::errors::{ErrorInfo, SweepError};

/// Decides whether the run owning `run_dir` needs to be dispatched again.
pub trait RunCompletionChecker {
    /// Returns true when the run behind `run_dir` should be skipped.
    fn is_complete(&self, run_dir: &Path) -> Result<bool, SweepError>;

    /// Called after the simulator exited successfully for `run_dir`.
    fn mark_complete(&self, _run_dir: &Path) -> Result<(), SweepError> {
        Ok(())
    }

    /// Short label used in logs and reports.
    fn describe(&self) -> String;
}

/// A run is complete as soon as its output directory exists. This cannot tell
/// a finished run from one that crashed after creating the directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryExists;

impl RunCompletionChecker for DirectoryExists {
    fn is_complete(&self, run_dir: &Path) -> Result<bool, SweepError> {
        Ok(run_dir.exists())
    }

    fn describe(&self) -> String {
        "directory".to_string()
    }
}

/// A run is complete only when a named file exists inside its output
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelFile {
    pub file_name: String,
    /// Write the sentinel after a zero exit. Off when the simulator itself
    /// writes the file (e.g. `summary.tsv`).
    pub write_on_success: bool,
}

impl RunCompletionChecker for SentinelFile {
    fn is_complete(&self, run_dir: &Path) -> Result<bool, SweepError> {
        Ok(run_dir.join(&self.file_name).is_file())
    }

    fn mark_complete(&self, run_dir: &Path) -> Result<(), SweepError> {
        if !self.write_on_success || !run_dir.is_dir() {
            return Ok(());
        }
        let path = run_dir.join(&self.file_name);
        fs::write(&path, b"complete\n").map_err(|err| {
            SweepError::Dispatch(
                ErrorInfo::new("sentinel_write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    fn describe(&self) -> String {
        format!("sentinel:{}", self.file_name)
    }
}

/// Plan-level selection of the completion strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CompletionSpec {
    #[default]
    Directory,
    Sentinel {
        #[serde(default = "CompletionSpec::default_sentinel")]
        file: String,
        #[serde(default = "CompletionSpec::default_write")]
        write_on_success: bool,
    },
}

impl CompletionSpec {
    fn default_sentinel() -> String {
        ".sweep-complete".to_string()
    }

    const fn default_write() -> bool {
        true
    }

    pub fn checker(&self) -> Box<dyn RunCompletionChecker> {
        match self {
            CompletionSpec::Directory => Box::new(DirectoryExists),
            CompletionSpec::Sentinel {
                file,
                write_on_success,
            } => Box::new(SentinelFile {
                file_name: file.clone(),
                write_on_success: *write_on_success,
            }),
        }
    }
}
