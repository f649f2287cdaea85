use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use wta_exp::{load_plan, to_canonical_json_bytes, SweepPlan};

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// YAML sweep plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Emit only JSON without additional context.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    ok: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: String,
    plan_hash: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(args: &DoctorArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    let report = diagnose(&plan)?;
    let rendered = String::from_utf8(to_canonical_json_bytes(&report)?)?;
    if args.quiet {
        println!("{}", rendered);
    } else {
        println!("wta-sweep doctor status: {}", report.status);
        println!("{}", rendered);
    }
    if report.status != "ok" {
        return Err("one or more checks failed".into());
    }
    Ok(())
}

fn diagnose(plan: &SweepPlan) -> Result<DoctorReport, Box<dyn Error>> {
    let paths = &plan.paths;
    let mut checks = vec![
        check_dir("trace_root", &paths.trace_root),
        check_dir("slack_dir", &paths.slack_dir),
        check_file("simulator.jar", &plan.simulator.jar),
    ];

    let output_parent = paths
        .output_root
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    checks.push(if paths.output_root.is_dir() {
        check_dir("output_root", &paths.output_root)
    } else {
        DoctorCheck {
            name: "output_root".into(),
            ok: output_parent.is_dir(),
            detail: format!("will be created under {}", output_parent.display()),
        }
    });

    if paths.trace_root.is_dir() {
        let traces = wta_exp::discover_traces(&paths.trace_root, &plan.trace_filter())?;
        checks.push(DoctorCheck {
            name: "traces".into(),
            ok: !traces.is_empty(),
            detail: format!("{} trace(s) match `{}`", traces.len(), plan.traces.filter),
        });
    }

    let status = if checks.iter().all(|check| check.ok) {
        "ok"
    } else {
        "needs-attention"
    };
    Ok(DoctorReport {
        status: status.into(),
        plan_hash: plan.plan_hash()?,
        checks,
    })
}

fn check_dir(name: &str, path: &Path) -> DoctorCheck {
    DoctorCheck {
        name: name.into(),
        ok: path.is_dir(),
        detail: path.display().to_string(),
    }
}

fn check_file(name: &str, path: &Path) -> DoctorCheck {
    DoctorCheck {
        name: name.into(),
        ok: path.is_file(),
        detail: path.display().to_string(),
    }
}
