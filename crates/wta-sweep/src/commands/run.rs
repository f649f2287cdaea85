use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tracing::{info, warn};
use wta_exp::{load_plan, ProcessLauncher, Sweep, SweepOptions};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Keep existing outputs instead of clearing the output root first.
    #[arg(long)]
    pub no_clean: bool,
    /// Skip the plan's build step.
    #[arg(long)]
    pub no_build: bool,
    /// Build and log every invocation without launching any.
    #[arg(long)]
    pub dry_run: bool,
    /// Write the JSON sweep report here.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    let opts = SweepOptions {
        clean: !args.no_clean,
        build: !args.no_build,
        dry_run: args.dry_run,
    };
    let report = Sweep::new(&plan).run(&mut ProcessLauncher, &opts)?;

    if let Some(path) = &args.report {
        report.write(path)?;
        info!(path = %path.display(), "wrote sweep report");
    }
    if let Some(cleanup) = &report.cleanup {
        for failure in &cleanup.failures {
            warn!(path = %failure.path.display(), reason = %failure.reason, "left in output root");
        }
    }
    let totals = report.totals;
    println!(
        "traces={} runs={} skipped={} planned={} completed={} failed={}",
        totals.traces, totals.runs, totals.skipped, totals.planned, totals.completed, totals.failed
    );
    Ok(())
}
