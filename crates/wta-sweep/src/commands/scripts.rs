use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use wta_exp::{load_plan, write_job_scripts, Sweep};

#[derive(Args, Debug)]
pub struct ScriptsArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Destination directory; defaults to `paths.jobs_dir`.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ScriptsArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    let runs = Sweep::new(&plan).plan_runs()?;
    let dir = args.out.as_ref().unwrap_or(&plan.paths.jobs_dir);
    let written = write_job_scripts(dir, &runs, &plan.job_scripts)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
