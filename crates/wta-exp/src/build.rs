use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wta_core::errors::{ErrorInfo, SweepError};

use crate::command::Invocation;
use crate::dispatch::Launcher;
use crate::report::ExitReport;

/// Package build executed once before the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    #[serde(default = "BuildStep::default_command")]
    pub command: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Abort the sweep when the build fails. Off by default: a broken build
    /// then shows up as failing runs.
    #[serde(default)]
    pub check: bool,
}

impl BuildStep {
    fn default_command() -> Vec<String> {
        vec!["mvn".to_string(), "package".to_string()]
    }

    pub fn invocation(&self) -> Result<Invocation, SweepError> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            SweepError::Config(
                ErrorInfo::new("empty_build_command", "build.command is empty")
                    .with_hint("remove the build section to skip the build"),
            )
        })?;
        let mut invocation = Invocation::new(program.clone());
        invocation.args = args.to_vec();
        invocation.working_dir = self.working_dir.clone();
        Ok(invocation)
    }
}

impl Default for BuildStep {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            working_dir: None,
            check: false,
        }
    }
}

fn build_failure(invocation: &Invocation, message: impl Into<String>) -> SweepError {
    SweepError::Build(
        ErrorInfo::new("build_failed", message).with_context("command", invocation.to_shell_line()),
    )
}

/// Runs the build. Failures are logged and only returned when `check` is set.
pub fn run_build(step: &BuildStep, launcher: &mut dyn Launcher) -> Result<Option<ExitReport>, SweepError> {
    let invocation = step.invocation()?;
    info!(command = %invocation.to_shell_line(), "building simulator");
    match launcher.launch(&invocation) {
        Ok(exit) if exit.success => Ok(Some(exit)),
        Ok(exit) => {
            warn!(code = ?exit.code, "simulator build failed");
            if step.check {
                return Err(build_failure(&invocation, format!("exit code {:?}", exit.code)));
            }
            Ok(Some(exit))
        }
        Err(err) => {
            warn!(error = %err, "simulator build could not be started");
            if step.check {
                return Err(build_failure(&invocation, err.to_string()));
            }
            Ok(None)
        }
    }
}
