use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wta_core::errors::{ErrorInfo, SweepError};
use wta_core::provenance::RunProvenance;

use crate::serde::to_canonical_json_bytes;
use crate::workspace::CleanupReport;

/// Exit information for one external process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReport {
    /// Exit code, absent when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl ExitReport {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

impl From<std::process::ExitStatus> for ExitReport {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

/// What the sweep did with a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RunOutcome {
    /// Dry run: the invocation was built but not launched.
    Planned,
    /// The completion checker reported the run as done.
    Skipped,
    Completed {
        exit_code: Option<i32>,
    },
    Failed {
        exit_code: Option<i32>,
        /// The output directory exists although the run failed; a directory
        /// based checker will treat it as complete next time.
        partial_output: bool,
    },
    LaunchError {
        message: String,
    },
}

/// Report entry for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub name: String,
    pub trace: String,
    pub placement_policy: String,
    pub datacenters: u32,
    /// Shell form of the invocation; empty for skipped runs.
    #[serde(default)]
    pub command: String,
    pub outcome: RunOutcome,
}

/// Counters over all runs of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepTotals {
    pub traces: usize,
    pub runs: usize,
    pub skipped: usize,
    pub planned: usize,
    pub completed: usize,
    pub failed: usize,
}

impl SweepTotals {
    fn tally(traces: usize, runs: &[RunRecord]) -> Self {
        let mut totals = SweepTotals {
            traces,
            runs: runs.len(),
            ..SweepTotals::default()
        };
        for run in runs {
            match run.outcome {
                RunOutcome::Planned => totals.planned += 1,
                RunOutcome::Skipped => totals.skipped += 1,
                RunOutcome::Completed { .. } => totals.completed += 1,
                RunOutcome::Failed { .. } | RunOutcome::LaunchError { .. } => totals.failed += 1,
            }
        }
        totals
    }

    /// Runs handed to the launcher.
    pub fn dispatched(&self) -> usize {
        self.completed + self.failed
    }
}

/// Persistable summary of one sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub plan_hash: String,
    /// Completion strategy used for skip decisions.
    pub completion: String,
    pub traces: Vec<String>,
    pub runs: Vec<RunRecord>,
    pub totals: SweepTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<ExitReport>,
    pub provenance: RunProvenance,
}

impl SweepReport {
    pub fn new(
        completion: String,
        traces: Vec<String>,
        runs: Vec<RunRecord>,
        provenance: RunProvenance,
    ) -> Self {
        let totals = SweepTotals::tally(traces.len(), &runs);
        Self {
            plan_hash: provenance.plan_hash.clone(),
            completion,
            traces,
            runs,
            totals,
            cleanup: None,
            build: None,
            provenance,
        }
    }

    /// Records of runs that reached the launcher.
    pub fn dispatched(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs.iter().filter(|run| {
            matches!(
                run.outcome,
                RunOutcome::Completed { .. }
                    | RunOutcome::Failed { .. }
                    | RunOutcome::LaunchError { .. }
            )
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), SweepError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                SweepError::Serde(ErrorInfo::new("report_dir", err.to_string()))
            })?;
        }
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| {
            SweepError::Serde(
                ErrorInfo::new("report_write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
