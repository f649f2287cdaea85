use std::error::Error;

use clap::{ArgAction, Parser, Subcommand};
use commands::{
    clean::{self, CleanArgs},
    doctor::{self, DoctorArgs},
    plan::{self, PlanArgs},
    run::{self, RunArgs},
    scripts::{self, ScriptsArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "wta-sweep", about = "WTA simulator experiment sweeps")]
struct Cli {
    /// Raise log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clear, build and dispatch every run that has no output yet.
    Run(RunArgs),
    /// List every run with its skip status and command line.
    Plan(PlanArgs),
    /// Clear the output root without dispatching anything.
    Clean(CleanArgs),
    /// Write one job script per pending run.
    Scripts(ScriptsArgs),
    /// Check that the plan's paths and simulator jar are in place.
    Doctor(DoctorArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Plan(args) => plan::run(&args),
        Command::Clean(args) => clean::run(&args),
        Command::Scripts(args) => scripts::run(&args),
        Command::Doctor(args) => doctor::run(&args),
    }
}
