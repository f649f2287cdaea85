mod common;

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use common::{capture_logs, RecordingLauncher, Scratch};
use wta_core::errors::SweepError;
use wta_exp::{
    BuildStep, CompletionSpec, FailurePolicy, RunCompletionChecker, RunOutcome, Sweep,
    SweepOptions,
};

const PARTIAL_OUTPUT_WARNING: &str = "failed run left an output directory";

fn resume_opts() -> SweepOptions {
    SweepOptions {
        clean: false,
        ..SweepOptions::default()
    }
}

#[test]
fn failures_are_recorded_and_sweep_continues_by_default() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let plan = scratch.plan("pegasus", &["fastest_machine", "look_ahead"], &[2]);
    let mut launcher = RecordingLauncher::failing(1, true);

    let report = Sweep::new(&plan).run(&mut launcher, &resume_opts()).expect("sweep");

    assert_eq!(launcher.invocations.len(), 2);
    assert_eq!(report.totals.failed, 2);
    assert!(report.runs.iter().all(|run| run.outcome
        == RunOutcome::Failed {
            exit_code: Some(1),
            partial_output: true,
        }));
}

#[test]
fn partial_directory_counts_as_complete_for_directory_checker() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let plan = scratch.plan("pegasus", &["fastest_machine"], &[2]);

    let mut crashing = RecordingLauncher::failing(137, true);
    Sweep::new(&plan).run(&mut crashing, &resume_opts()).expect("first sweep");

    let mut second = RecordingLauncher::simulating();
    let report = Sweep::new(&plan).run(&mut second, &resume_opts()).expect("second sweep");
    assert!(second.invocations.is_empty());
    assert_eq!(report.totals.skipped, 1);
}

#[test]
fn sentinel_checker_reruns_partial_output() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let mut plan = scratch.plan("pegasus", &["fastest_machine"], &[2]);
    plan.completion = CompletionSpec::Sentinel {
        file: ".sweep-complete".into(),
        write_on_success: true,
    };

    let mut crashing = RecordingLauncher::failing(137, true);
    let report = Sweep::new(&plan).run(&mut crashing, &resume_opts()).expect("first sweep");
    let run_dir = scratch.output_root().join(&report.runs[0].name);
    fs::write(run_dir.join("stats.tsv"), "stale\n").expect("partial stats");

    let mut second = RecordingLauncher::simulating();
    let (report, logs) = capture_logs(|| Sweep::new(&plan).run(&mut second, &resume_opts()));
    let report = report.expect("second sweep");
    assert_eq!(second.invocations.len(), 1);
    assert_eq!(second.output_preexisting, vec![false]);
    assert!(logs.contains("discarding incomplete output"), "{logs}");
    assert_eq!(report.totals.completed, 1);
    assert_eq!(report.completion, "sentinel:.sweep-complete");

    assert!(!run_dir.join("stats.tsv").exists());
    assert!(run_dir.join(".sweep-complete").is_file());

    let mut third = RecordingLauncher::simulating();
    Sweep::new(&plan).run(&mut third, &resume_opts()).expect("third sweep");
    assert!(third.invocations.is_empty());
}

#[test]
fn abort_policy_stops_at_first_failure() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let mut plan = scratch.plan("pegasus", &["fastest_machine", "look_ahead"], &[1, 2]);
    plan.on_failure = FailurePolicy::Abort;
    let mut launcher = RecordingLauncher::failing(2, false);

    let err = Sweep::new(&plan)
        .run(&mut launcher, &resume_opts())
        .expect_err("abort");

    assert_eq!(err.code(), "run_failed");
    assert_eq!(launcher.invocations.len(), 1);
    assert_eq!(
        err.info().context.get("run").map(String::as_str),
        Some("pegasus_p7_parquet_bundle_tpp_fastest_machine_dcs_1_roundRobin")
    );
}

#[test]
fn launch_errors_are_recorded_under_warn_policy() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let mut plan = scratch.plan("pegasus", &["fastest_machine"], &[2]);
    plan.on_failure = FailurePolicy::Warn;
    let mut launcher = RecordingLauncher {
        missing_program: true,
        ..RecordingLauncher::default()
    };

    let report = Sweep::new(&plan).run(&mut launcher, &resume_opts()).expect("sweep");

    assert!(matches!(
        report.runs[0].outcome,
        RunOutcome::LaunchError { .. }
    ));
    assert_eq!(report.totals.failed, 1);
}

#[test]
fn failed_build_is_unchecked_by_default() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let mut plan = scratch.plan("pegasus", &["fastest_machine"], &[2]);
    plan.build = Some(BuildStep::default());
    let mut launcher = RecordingLauncher::failing(1, false);

    let report = Sweep::new(&plan).run(&mut launcher, &resume_opts()).expect("sweep");

    assert_eq!(launcher.invocations[0].program, "mvn");
    assert_eq!(launcher.invocations[0].args, vec!["package".to_string()]);
    assert_eq!(report.build.map(|exit| exit.success), Some(false));
    assert_eq!(launcher.invocations.len(), 2);
}

#[test]
fn checked_build_failure_aborts_before_any_run() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let mut plan = scratch.plan("pegasus", &["fastest_machine"], &[2]);
    plan.build = Some(BuildStep {
        check: true,
        ..BuildStep::default()
    });
    let mut launcher = RecordingLauncher::failing(1, false);

    let err = Sweep::new(&plan)
        .run(&mut launcher, &resume_opts())
        .expect_err("build failure");

    assert_eq!(err.code(), "build_failed");
    assert_eq!(launcher.invocations.len(), 1);
    assert!(fs::read_dir(scratch.output_root()).unwrap().next().is_none());
}

#[test]
fn partial_output_warning_is_logged_under_every_policy() {
    for policy in [FailurePolicy::Ignore, FailurePolicy::Warn, FailurePolicy::Abort] {
        let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
        let mut plan = scratch.plan("pegasus", &["fastest_machine"], &[2]);
        plan.on_failure = policy;
        let mut launcher = RecordingLauncher::failing(137, true);

        let (result, logs) =
            capture_logs(|| Sweep::new(&plan).run(&mut launcher, &resume_opts()));

        assert_eq!(result.is_err(), policy == FailurePolicy::Abort, "{policy:?}");
        assert!(
            logs.lines()
                .any(|line| line.contains("WARN") && line.contains(PARTIAL_OUTPUT_WARNING)),
            "{policy:?}: {logs}"
        );
    }
}

#[test]
fn failure_without_output_does_not_warn_about_partial_output() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let plan = scratch.plan("pegasus", &["fastest_machine"], &[2]);
    let mut launcher = RecordingLauncher::failing(1, false);

    let (result, logs) = capture_logs(|| Sweep::new(&plan).run(&mut launcher, &resume_opts()));

    assert_eq!(result.expect("sweep").totals.failed, 1);
    assert!(!logs.contains(PARTIAL_OUTPUT_WARNING), "{logs}");
}

/// Treats runs listed in `done` as complete and records every completion.
#[derive(Debug, Default)]
struct ListedRuns {
    done: Vec<String>,
    marked: Rc<RefCell<Vec<PathBuf>>>,
}

impl RunCompletionChecker for ListedRuns {
    fn is_complete(&self, run_dir: &Path) -> Result<bool, SweepError> {
        Ok(run_dir
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| self.done.iter().any(|done| done == name)))
    }

    fn mark_complete(&self, run_dir: &Path) -> Result<(), SweepError> {
        self.marked.borrow_mut().push(run_dir.to_path_buf());
        Ok(())
    }

    fn describe(&self) -> String {
        "listed".to_string()
    }
}

#[test]
fn custom_checker_decides_which_runs_are_dispatched() {
    let scratch = Scratch::new(&["pegasus_p7_parquet_bundle"]);
    let plan = scratch.plan("pegasus", &["fastest_machine", "look_ahead"], &[2]);
    let done = "pegasus_p7_parquet_bundle_tpp_fastest_machine_dcs_2_roundRobin";
    let rerun = "pegasus_p7_parquet_bundle_tpp_look_ahead_dcs_2_roundRobin";
    let marked = Rc::new(RefCell::new(Vec::new()));
    let checker = ListedRuns {
        done: vec![done.to_string()],
        marked: Rc::clone(&marked),
    };
    let mut launcher = RecordingLauncher::simulating();

    let report = Sweep::with_checker(&plan, Box::new(checker))
        .run(&mut launcher, &resume_opts())
        .expect("sweep");

    assert_eq!(report.completion, "listed");
    assert_eq!(launcher.invocations.len(), 1);
    let outcomes: Vec<(&str, &RunOutcome)> = report
        .runs
        .iter()
        .map(|run| (run.name.as_str(), &run.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (done, &RunOutcome::Skipped),
            (rerun, &RunOutcome::Completed { exit_code: Some(0) }),
        ]
    );
    assert_eq!(*marked.borrow(), vec![scratch.output_root().join(rerun)]);
}
