//! Experiment matrix generation and sequential dispatch of WTA simulator runs.

pub mod axes;
pub mod build;
pub mod command;
pub mod completion;
pub mod discovery;
pub mod dispatch;
pub mod fleet;
pub mod jobscript;
pub mod matrix;
pub mod naming;
pub mod plan;
pub mod report;
pub mod serde;
pub mod workspace;

pub use axes::{Axis, AxisSet, AxisValue, Combination, VARYING_AXES};
pub use build::{run_build, BuildStep};
pub use command::{render_flag, CommandBuilder, Invocation, SimulatorSpec};
pub use completion::{CompletionSpec, DirectoryExists, RunCompletionChecker, SentinelFile};
pub use discovery::{discover_traces, TraceFilter};
pub use dispatch::{FailurePolicy, Launcher, PlannedRun, ProcessLauncher, Sweep, SweepOptions};
pub use fleet::FleetSpec;
pub use jobscript::{render_job_script, write_job_scripts};
pub use matrix::{expand_runs, FixedAxes, RunSpec};
pub use naming::{parse_run_name, run_name};
pub use plan::{load_plan, AxesSpec, JobScriptSpec, PathsSpec, SlurmHeader, SweepPlan};
pub use report::{ExitReport, RunOutcome, RunRecord, SweepReport, SweepTotals};
pub use crate::serde::{content_digest, to_canonical_json_bytes};
pub use workspace::{clear_output_root, CleanupFailure, CleanupReport};
