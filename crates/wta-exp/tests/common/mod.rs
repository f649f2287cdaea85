#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;
use wta_core::errors::{ErrorInfo, SweepError};
use wta_exp::{
    AxesSpec, ExitReport, FleetSpec, Invocation, Launcher, PathsSpec, SimulatorSpec, SweepPlan,
    TraceFilter,
};

/// Stands in for the simulator: records every invocation and, like the real
/// program, creates the `-o` directory before exiting.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub invocations: Vec<Invocation>,
    /// Whether the `-o` directory already existed when each launch began.
    pub output_preexisting: Vec<bool>,
    pub exit_code: i32,
    pub create_output: bool,
    pub missing_program: bool,
}

impl RecordingLauncher {
    pub fn simulating() -> Self {
        Self {
            create_output: true,
            ..Self::default()
        }
    }

    pub fn failing(exit_code: i32, create_output: bool) -> Self {
        Self {
            exit_code,
            create_output,
            ..Self::default()
        }
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<ExitReport, SweepError> {
        self.invocations.push(invocation.clone());
        let out = invocation.values_of("-o").and_then(|values| values.first().copied());
        self.output_preexisting
            .push(out.map_or(false, |out| Path::new(out).exists()));
        if self.missing_program {
            return Err(SweepError::Dispatch(ErrorInfo::new(
                "launch_failed",
                "No such file or directory",
            )));
        }
        if self.create_output {
            if let Some(out) = out {
                fs::create_dir_all(out).expect("create run output");
            }
        }
        Ok(ExitReport::from_code(self.exit_code))
    }
}

/// Captures formatted log lines emitted while `f` runs.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, buffer.contents())
}

#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Scratch layout with a trace root, an output root and a slack directory.
pub struct Scratch {
    pub dir: TempDir,
}

impl Scratch {
    pub fn new(traces: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("tmp dir");
        for trace in traces {
            fs::create_dir_all(dir.path().join("input_traces").join(trace)).expect("trace dir");
        }
        fs::create_dir_all(dir.path().join("results/sim_output")).expect("output root");
        fs::create_dir_all(dir.path().join("results/look_ahead")).expect("slack dir");
        Self { dir }
    }

    pub fn trace_root(&self) -> PathBuf {
        self.dir.path().join("input_traces")
    }

    pub fn output_root(&self) -> PathBuf {
        self.dir.path().join("results/sim_output")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn plan(&self, filter: &str, placements: &[&str], datacenters: &[u32]) -> SweepPlan {
        SweepPlan {
            paths: PathsSpec {
                trace_root: self.trace_root(),
                output_root: self.output_root(),
                slack_dir: self.dir.path().join("results/look_ahead"),
                jobs_dir: self.dir.path().join("jobscripts"),
            },
            traces: TraceFilter::new(filter),
            fleet: FleetSpec {
                resources: vec![64],
                tdps: vec![225],
                base_clocks: vec![2.45],
                fractions: vec![1.0],
                dvfs: true,
            },
            axes: AxesSpec {
                machines_per_dc: vec![9],
                task_selection_policies: vec!["fcfs".to_string()],
                task_placement_policies: placements.iter().map(|p| p.to_string()).collect(),
                datacenters: datacenters.to_vec(),
            },
            simulator: SimulatorSpec::default(),
            build: None,
            completion: Default::default(),
            on_failure: Default::default(),
            clean_output: false,
            job_scripts: Default::default(),
            base_dir: self.dir.path().to_path_buf(),
        }
    }
}
