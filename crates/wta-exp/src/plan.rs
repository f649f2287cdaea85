use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use wta_core::errors::{ErrorInfo, SweepError};

use crate::axes::{Axis, AxisSet, DATACENTERS, TASK_PLACEMENT_POLICIES, VARYING_AXES};
use crate::build::BuildStep;
use crate::command::{CommandBuilder, SimulatorSpec};
use crate::completion::CompletionSpec;
use crate::discovery::TraceFilter;
use crate::dispatch::FailurePolicy;
use crate::fleet::FleetSpec;
use crate::matrix::FixedAxes;
use crate::naming::validate_component;
use crate::serde::{content_digest, from_yaml_slice, to_yaml_string};

/// Placement policies the simulator registers.
pub const KNOWN_PLACEMENT_POLICIES: [&str; 3] = ["best_fit", "look_ahead", "fastest_machine"];
/// Task order policies the simulator registers.
pub const KNOWN_SELECTION_POLICIES: [&str; 3] = ["fcfs", "sjf", "ewf"];

fn config_error(code: &str, message: impl Into<String>) -> SweepError {
    SweepError::Config(ErrorInfo::new(code, message))
}

/// Filesystem locations used by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsSpec {
    /// Directory whose immediate subdirectories are traces.
    pub trace_root: PathBuf,
    /// Directory receiving one subdirectory per run.
    pub output_root: PathBuf,
    /// Look-ahead slack directory handed to the simulator (`-sd`).
    pub slack_dir: PathBuf,
    /// Destination of persisted job scripts.
    #[serde(default = "PathsSpec::default_jobs_dir")]
    pub jobs_dir: PathBuf,
}

impl PathsSpec {
    fn default_jobs_dir() -> PathBuf {
        PathBuf::from("jobscripts")
    }
}

/// Candidate values per axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxesSpec {
    /// Machines per datacenter (`-m`), passed whole to every run.
    pub machines_per_dc: Vec<u32>,
    /// Task order policies (`--task-order-policy`), passed whole to every run.
    pub task_selection_policies: Vec<String>,
    /// Varying: one run per placement policy.
    pub task_placement_policies: Vec<String>,
    /// Varying: one run per datacenter count.
    pub datacenters: Vec<u32>,
}

/// Optional job script settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScriptSpec {
    /// Emit `#SBATCH` header lines.
    #[serde(default)]
    pub slurm: Option<SlurmHeader>,
}

/// Batch scheduler header written at the top of job scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlurmHeader {
    #[serde(default = "SlurmHeader::default_time")]
    pub time: String,
}

impl SlurmHeader {
    fn default_time() -> String {
        "48-00:00".to_string()
    }
}

/// Complete configuration of one sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    pub paths: PathsSpec,
    pub traces: TraceFilter,
    pub fleet: FleetSpec,
    pub axes: AxesSpec,
    #[serde(default)]
    pub simulator: SimulatorSpec,
    /// Package build run once before the sweep; omitted means no build.
    #[serde(default)]
    pub build: Option<BuildStep>,
    #[serde(default)]
    pub completion: CompletionSpec,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    /// Delete everything under `paths.output_root` before the sweep.
    #[serde(default = "SweepPlan::default_clean_output")]
    pub clean_output: bool,
    #[serde(default)]
    pub job_scripts: JobScriptSpec,
    /// Directory containing the plan on disk (ignored when serializing).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl SweepPlan {
    const fn default_clean_output() -> bool {
        true
    }

    /// Deterministic hash of the plan contents.
    pub fn plan_hash(&self) -> Result<String, SweepError> {
        content_digest(self)
    }

    pub fn to_yaml_string(&self) -> Result<String, SweepError> {
        to_yaml_string(self, "plan")
    }

    pub fn trace_filter(&self) -> TraceFilter {
        self.traces.clone()
    }

    /// The axes the sweep iterates over. Fixed lists are passed whole to every
    /// run through [`SweepPlan::fixed_axes`].
    pub fn axis_set(&self) -> Result<AxisSet, SweepError> {
        AxisSet::new()
            .with(Axis::new(
                TASK_PLACEMENT_POLICIES,
                self.axes.task_placement_policies.iter(),
            )?)?
            .with(Axis::new(DATACENTERS, self.axes.datacenters.iter().copied())?)
    }

    pub fn fixed_axes(&self) -> FixedAxes<'_> {
        FixedAxes {
            fleet: &self.fleet,
            machines_per_dc: &self.axes.machines_per_dc,
            task_selection_policies: &self.axes.task_selection_policies,
        }
    }

    pub fn command_builder(&self) -> CommandBuilder<'_> {
        CommandBuilder::new(
            &self.simulator,
            &self.paths.trace_root,
            &self.paths.output_root,
            &self.paths.slack_dir,
        )
    }

    /// Paths the output clear must never touch.
    pub fn protected_paths(&self) -> Vec<&Path> {
        vec![
            self.paths.trace_root.as_path(),
            self.paths.slack_dir.as_path(),
            self.paths.jobs_dir.as_path(),
            self.base_dir.as_path(),
        ]
    }

    /// Checks the invariants every later stage relies on.
    pub fn validate(&self) -> Result<(), SweepError> {
        self.fleet.validate()?;
        let fixed = [
            ("machines_per_dc", self.axes.machines_per_dc.is_empty()),
            ("task_selection_policies", self.axes.task_selection_policies.is_empty()),
        ];
        if let Some((name, _)) = fixed.iter().find(|(_, empty)| *empty) {
            return Err(SweepError::Config(
                ErrorInfo::new("empty_axis", "axis must list at least one value")
                    .with_context("axis", *name),
            ));
        }
        let axes = self.axis_set()?;
        for name in VARYING_AXES {
            let axis = axes.require(name)?;
            if let Some(value) = axis.first_duplicate() {
                return Err(SweepError::Config(
                    ErrorInfo::new("duplicate_axis_value", "varying axis lists a value twice")
                        .with_context("axis", name)
                        .with_context("value", value),
                ));
            }
        }
        if self.axes.datacenters.contains(&0) {
            return Err(config_error(
                "invalid_datacenters",
                "datacenter counts must be positive",
            ));
        }
        for policy in &self.axes.task_placement_policies {
            validate_component(TASK_PLACEMENT_POLICIES, policy)?;
            if !KNOWN_PLACEMENT_POLICIES.contains(&policy.as_str()) {
                warn!(policy = %policy, "placement policy is not registered by the simulator");
            }
        }
        for policy in &self.axes.task_selection_policies {
            if !KNOWN_SELECTION_POLICIES.contains(&policy.as_str()) {
                warn!(policy = %policy, "task order policy is not registered by the simulator");
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self) {
        let base = self.base_dir.clone();
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.paths.trace_root);
        resolve(&mut self.paths.output_root);
        resolve(&mut self.paths.slack_dir);
        resolve(&mut self.paths.jobs_dir);
        resolve(&mut self.simulator.jar);
        if let Some(dir) = self.build.as_mut().and_then(|build| build.working_dir.as_mut()) {
            resolve(dir);
        }
    }
}

/// Parses and validates a plan. Relative paths are taken relative to the
/// directory holding the plan file.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<SweepPlan, SweepError> {
    let plan_path = path.as_ref();
    let bytes = fs::read(plan_path).map_err(|err| {
        SweepError::Config(
            ErrorInfo::new("plan_read", err.to_string())
                .with_context("path", plan_path.display().to_string()),
        )
    })?;
    let mut plan: SweepPlan = from_yaml_slice(&bytes, "plan")?;
    plan.base_dir = plan_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    plan.resolve_paths();
    plan.validate()?;
    Ok(plan)
}
