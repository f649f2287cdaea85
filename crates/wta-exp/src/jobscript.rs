//! Persisted job scripts, one per pending run. Scripts are written, never
//! submitted.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use wta_core::errors::{ErrorInfo, SweepError};

use crate::command::{shell_quote, Invocation};
use crate::dispatch::PlannedRun;
use crate::plan::JobScriptSpec;

fn script_error(path: &Path, err: impl ToString) -> SweepError {
    SweepError::Workspace(
        ErrorInfo::new("job_script_write", err.to_string())
            .with_context("path", path.display().to_string()),
    )
}

/// Script body for one run.
pub fn render_job_script(name: &str, invocation: &Invocation, spec: &JobScriptSpec) -> String {
    let mut lines = vec!["#!/bin/bash".to_string()];
    if let Some(slurm) = &spec.slurm {
        lines.push(format!("#SBATCH --job-name={name}.job"));
        lines.push(format!("#SBATCH --output={name}.out"));
        lines.push(format!("#SBATCH --error={name}.err"));
        lines.push(format!("#SBATCH --time={}", slurm.time));
    }
    if let Some(dir) = &invocation.working_dir {
        lines.push(format!("cd {}", shell_quote(&dir.to_string_lossy())));
    }
    lines.push(invocation.to_shell_line());
    lines.push(String::new());
    lines.join("\n")
}

/// Writes `<dir>/<name>.job` for every run that still needs dispatching and
/// returns the written paths.
pub fn write_job_scripts(
    dir: &Path,
    runs: &[PlannedRun],
    spec: &JobScriptSpec,
) -> Result<Vec<PathBuf>, SweepError> {
    fs::create_dir_all(dir).map_err(|err| script_error(dir, err))?;
    let mut written = Vec::new();
    for run in runs {
        let Some(invocation) = &run.invocation else {
            continue;
        };
        let path = dir.join(format!("{}.job", run.spec.name()));
        fs::write(&path, render_job_script(run.spec.name(), invocation, spec))
            .map_err(|err| script_error(&path, err))?;
        written.push(path);
    }
    info!(dir = %dir.display(), scripts = written.len(), "wrote job scripts");
    Ok(written)
}
