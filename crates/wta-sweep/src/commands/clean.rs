use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use wta_exp::{clear_output_root, load_plan};

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
}

pub fn run(args: &CleanArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    let report = clear_output_root(&plan.paths.output_root, &plan.protected_paths())?;
    println!(
        "removed={} failed={}",
        report.removed.len(),
        report.failures.len()
    );
    if !report.failures.is_empty() {
        return Err("some entries could not be removed".into());
    }
    Ok(())
}
