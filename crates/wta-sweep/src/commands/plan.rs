use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use wta_exp::{load_plan, Sweep};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Print one JSON object per run instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &PlanArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    let runs = Sweep::new(&plan).plan_runs()?;
    for run in &runs {
        let command = run
            .invocation
            .as_ref()
            .map(|invocation| invocation.to_shell_line());
        if args.json {
            let line = serde_json::json!({
                "name": run.spec.name(),
                "trace": run.spec.trace,
                "complete": run.is_complete(),
                "command": command,
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            let status = if run.is_complete() { "done" } else { "pending" };
            println!("{status}\t{}", run.spec.name());
            if let Some(command) = command {
                println!("\t{command}");
            }
        }
    }
    Ok(())
}
