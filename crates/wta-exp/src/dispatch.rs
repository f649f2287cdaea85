//! Sequential sweep driver: discovery, expansion, skip checks and launches.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use wta_core::errors::{ErrorInfo, SweepError};
use wta_core::provenance::{RunProvenance, SchemaVersion};

use crate::build::run_build;
use crate::command::Invocation;
use crate::completion::RunCompletionChecker;
use crate::discovery::discover_traces;
use crate::matrix::{expand_runs, RunSpec};
use crate::plan::SweepPlan;
use crate::report::{ExitReport, RunOutcome, RunRecord, SweepReport};
use crate::workspace::{clear_output_root, remove_entry};

/// Executes invocations.
pub trait Launcher {
    /// Runs `invocation` to completion.
    fn launch(&mut self, invocation: &Invocation) -> Result<ExitReport, SweepError>;
}

/// Runs invocations as child processes with inherited stdio, blocking until
/// each exits. No timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<ExitReport, SweepError> {
        let status = invocation.to_command().status().map_err(|err| {
            SweepError::Dispatch(
                ErrorInfo::new("launch_failed", err.to_string())
                    .with_context("program", invocation.program.clone()),
            )
        })?;
        Ok(ExitReport::from(status))
    }
}

/// Reaction to a run whose process failed or could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the failure in the report and continue.
    #[default]
    Ignore,
    /// Record, log a warning and continue.
    Warn,
    /// Stop the sweep at the first failure.
    Abort,
}

/// Per-invocation switches layered over the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOptions {
    /// Clear the output root first (also requires `clean_output` in the plan).
    pub clean: bool,
    /// Run the plan's build step first.
    pub build: bool,
    /// Build invocations without launching them.
    pub dry_run: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            clean: true,
            build: true,
            dry_run: false,
        }
    }
}

/// A run after the skip check.
#[derive(Debug, Clone)]
pub struct PlannedRun {
    pub spec: RunSpec,
    pub output_dir: PathBuf,
    /// Present only for runs that still need to be dispatched.
    pub invocation: Option<Invocation>,
}

impl PlannedRun {
    pub fn is_complete(&self) -> bool {
        self.invocation.is_none()
    }

    fn record(&self, outcome: RunOutcome) -> RunRecord {
        RunRecord {
            name: self.spec.name().to_string(),
            trace: self.spec.trace.clone(),
            placement_policy: self.spec.placement_policy.clone(),
            datacenters: self.spec.datacenters,
            command: self
                .invocation
                .as_ref()
                .map(Invocation::to_shell_line)
                .unwrap_or_default(),
            outcome,
        }
    }
}

/// Sweep over a plan with a completion checker.
pub struct Sweep<'a> {
    plan: &'a SweepPlan,
    checker: Box<dyn RunCompletionChecker>,
}

impl<'a> Sweep<'a> {
    /// Uses the checker configured in the plan.
    pub fn new(plan: &'a SweepPlan) -> Self {
        Self {
            plan,
            checker: plan.completion.checker(),
        }
    }

    pub fn with_checker(plan: &'a SweepPlan, checker: Box<dyn RunCompletionChecker>) -> Self {
        Self { plan, checker }
    }

    /// Traces selected by the plan's filter.
    pub fn traces(&self) -> Result<Vec<String>, SweepError> {
        discover_traces(&self.plan.paths.trace_root, &self.plan.trace_filter())
    }

    /// Expands and skip-checks every run of `trace`.
    pub fn plan_trace(&self, trace: &str) -> Result<Vec<PlannedRun>, SweepError> {
        let axes = self.plan.axis_set()?;
        let builder = self.plan.command_builder();
        expand_runs(trace, &axes, &self.plan.fixed_axes())?
            .into_iter()
            .map(|spec| {
                let output_dir = builder.output_dir(&spec);
                let invocation = if self.checker.is_complete(&output_dir)? {
                    None
                } else {
                    Some(builder.build(&spec))
                };
                Ok(PlannedRun {
                    spec,
                    output_dir,
                    invocation,
                })
            })
            .collect()
    }

    /// Expands and skip-checks the runs of every selected trace.
    pub fn plan_runs(&self) -> Result<Vec<PlannedRun>, SweepError> {
        let mut runs = Vec::new();
        for trace in self.traces()? {
            runs.extend(self.plan_trace(&trace)?);
        }
        Ok(runs)
    }

    /// Runs the sweep: optional clear and build, then one blocking launch per
    /// run that is not complete yet.
    pub fn run(
        &self,
        launcher: &mut dyn Launcher,
        opts: &SweepOptions,
    ) -> Result<SweepReport, SweepError> {
        let started_at = Utc::now().to_rfc3339();
        let plan = self.plan;

        let cleanup = if opts.clean && plan.clean_output && !opts.dry_run {
            Some(clear_output_root(
                &plan.paths.output_root,
                &plan.protected_paths(),
            )?)
        } else {
            None
        };

        let build = match (&plan.build, opts.build && !opts.dry_run) {
            (Some(step), true) => run_build(step, launcher)?,
            _ => None,
        };

        let traces = self.traces()?;
        info!(traces = traces.len(), completion = %self.checker.describe(), "starting sweep");
        let mut records = Vec::new();
        for trace in &traces {
            info!(trace = %trace, "sweeping trace");
            // Skip checks must observe outputs written earlier in this sweep.
            for run in self.plan_trace(trace)? {
                let outcome = self.dispatch(&run, launcher, opts.dry_run)?;
                records.push(run.record(outcome));
            }
        }

        let provenance = RunProvenance {
            plan_hash: plan.plan_hash()?,
            schema: SchemaVersion::CURRENT,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            tool_versions: [(
                env!("CARGO_PKG_NAME").to_string(),
                env!("CARGO_PKG_VERSION").to_string(),
            )]
            .into_iter()
            .collect(),
        };
        let mut report = SweepReport::new(self.checker.describe(), traces, records, provenance);
        report.cleanup = cleanup;
        report.build = build;
        info!(
            dispatched = report.totals.dispatched(),
            skipped = report.totals.skipped,
            failed = report.totals.failed,
            "sweep finished"
        );
        Ok(report)
    }

    fn dispatch(
        &self,
        run: &PlannedRun,
        launcher: &mut dyn Launcher,
        dry_run: bool,
    ) -> Result<RunOutcome, SweepError> {
        let name = run.spec.name();
        let Some(invocation) = &run.invocation else {
            debug!(run = name, "output present, skipping");
            return Ok(RunOutcome::Skipped);
        };
        if dry_run {
            info!(run = name, command = %invocation.to_shell_line(), "planned");
            return Ok(RunOutcome::Planned);
        }

        if fs::symlink_metadata(&run.output_dir).is_ok() {
            warn!(
                run = name,
                path = %run.output_dir.display(),
                "discarding incomplete output before re-running"
            );
            if let Err(err) = remove_entry(&run.output_dir) {
                let outcome = RunOutcome::LaunchError {
                    message: format!("could not discard incomplete output: {err}"),
                };
                self.on_failure(name, &outcome)?;
                return Ok(outcome);
            }
        }

        info!(run = name, "dispatching");
        debug!(command = %invocation.to_shell_line());
        let outcome = match launcher.launch(invocation) {
            Ok(exit) if exit.success => {
                if let Err(err) = self.checker.mark_complete(&run.output_dir) {
                    warn!(run = name, error = %err, "could not record completion");
                }
                return Ok(RunOutcome::Completed {
                    exit_code: exit.code,
                });
            }
            Ok(exit) => RunOutcome::Failed {
                exit_code: exit.code,
                partial_output: run.output_dir.exists(),
            },
            Err(err) => RunOutcome::LaunchError {
                message: err.to_string(),
            },
        };
        self.on_failure(name, &outcome)?;
        Ok(outcome)
    }

    fn on_failure(&self, name: &str, outcome: &RunOutcome) -> Result<(), SweepError> {
        if let RunOutcome::Failed {
            partial_output: true,
            ..
        } = outcome
        {
            warn!(
                run = name,
                "failed run left an output directory; a directory based checker will skip it next time"
            );
        }
        match self.plan.on_failure {
            FailurePolicy::Ignore => {
                debug!(run = name, ?outcome, "run failed");
                Ok(())
            }
            FailurePolicy::Warn => {
                warn!(run = name, ?outcome, "run failed");
                Ok(())
            }
            FailurePolicy::Abort => {
                error!(run = name, ?outcome, "run failed, aborting sweep");
                Err(SweepError::Dispatch(
                    ErrorInfo::new("run_failed", format!("{outcome:?}"))
                        .with_context("run", name)
                        .with_hint("set on_failure to `warn` or `ignore` to keep going"),
                ))
            }
        }
    }
}
