//! Rendering a [`RunSpec`] into the simulator's command line.
//!
//! Every list-valued flag goes through [`render_flag`]: the flag token
//! followed by one token per value, in list order. Shell-joined output
//! (`-c 64 128`) is only produced by [`Invocation::to_shell_line`].

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::axes::AxisValue;
use crate::matrix::RunSpec;

impl From<&Path> for AxisValue {
    fn from(value: &Path) -> Self {
        AxisValue::Text(value.to_string_lossy().into_owned())
    }
}

impl From<&String> for AxisValue {
    fn from(value: &String) -> Self {
        AxisValue::Text(value.clone())
    }
}

/// Renders one flag and its ordered values into argv tokens.
pub fn render_flag(flag: &str, values: &[AxisValue]) -> Vec<String> {
    std::iter::once(flag.to_string())
        .chain(values.iter().map(ToString::to_string))
        .collect()
}

fn typed<T, I>(values: I) -> Vec<AxisValue>
where
    I: IntoIterator<Item = T>,
    T: Into<AxisValue>,
{
    values.into_iter().map(Into::into).collect()
}

/// JVM launch settings shared by every run of a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorSpec {
    #[serde(default = "SimulatorSpec::default_java")]
    pub java: String,
    /// Maximum heap passed as `-Xmx`.
    #[serde(default = "SimulatorSpec::default_heap")]
    pub heap: String,
    #[serde(default = "SimulatorSpec::default_jar")]
    pub jar: PathBuf,
    #[serde(default = "SimulatorSpec::default_main_class")]
    pub main_class: String,
    /// Trace reader format (`-f`).
    #[serde(default = "SimulatorSpec::default_format")]
    pub format: String,
}

impl SimulatorSpec {
    fn default_java() -> String {
        "java".to_string()
    }

    fn default_heap() -> String {
        "60g".to_string()
    }

    fn default_jar() -> PathBuf {
        PathBuf::from("target/wta-sim-0.1.jar")
    }

    fn default_main_class() -> String {
        "science.atlarge.wta.simulator.WTASim".to_string()
    }

    fn default_format() -> String {
        "wta".to_string()
    }
}

impl Default for SimulatorSpec {
    fn default() -> Self {
        Self {
            java: Self::default_java(),
            heap: Self::default_heap(),
            jar: Self::default_jar(),
            main_class: Self::default_main_class(),
            format: Self::default_format(),
        }
    }
}

/// Program and argument tokens for one external process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn flag(mut self, flag: &str, values: &[AxisValue]) -> Self {
        self.args.extend(render_flag(flag, values));
        self
    }

    /// Program followed by its arguments.
    pub fn tokens(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Tokens that follow `flag`, up to the next flag token.
    pub fn values_of(&self, flag: &str) -> Option<Vec<&str>> {
        let start = self.args.iter().position(|arg| arg == flag)? + 1;
        Some(
            self.args[start..]
                .iter()
                .take_while(|arg| !is_flag_token(arg))
                .map(String::as_str)
                .collect(),
        )
    }

    /// Single-line shell form, quoting tokens that need it.
    pub fn to_shell_line(&self) -> String {
        self.tokens()
            .into_iter()
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

fn is_flag_token(token: &str) -> bool {
    token.starts_with('-') && token.parse::<f64>().is_err()
}

pub(crate) fn shell_quote(token: &str) -> Cow<'_, str> {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', r"'\''")))
    }
}

/// Builds simulator invocations for the runs of one sweep.
#[derive(Debug, Clone)]
pub struct CommandBuilder<'a> {
    simulator: &'a SimulatorSpec,
    trace_root: &'a Path,
    output_root: &'a Path,
    slack_dir: &'a Path,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(
        simulator: &'a SimulatorSpec,
        trace_root: &'a Path,
        output_root: &'a Path,
        slack_dir: &'a Path,
    ) -> Self {
        Self {
            simulator,
            trace_root,
            output_root,
            slack_dir,
        }
    }

    pub fn output_dir(&self, run: &RunSpec) -> PathBuf {
        self.output_root.join(run.name())
    }

    pub fn trace_dir(&self, run: &RunSpec) -> PathBuf {
        self.trace_root.join(&run.trace)
    }

    /// Renders `run` in the argument order the simulator expects. Nothing is
    /// validated here; bad values surface as a simulator exit code.
    pub fn build(&self, run: &RunSpec) -> Invocation {
        let sim = self.simulator;
        let fleet = &run.fleet;
        Invocation::new(sim.java.clone())
            .arg(format!("-Xmx{}", sim.heap))
            .arg("-cp")
            .arg(sim.jar.to_string_lossy())
            .arg(sim.main_class.clone())
            .flag("-f", &[AxisValue::from(sim.format.as_str())])
            .flag("-c", &typed(fleet.resources.iter().copied()))
            .flag("-t", &typed(fleet.tdps.iter().copied()))
            .flag("-bc", &typed(fleet.base_clocks.iter().copied()))
            .flag("-mf", &typed(fleet.fractions.iter().copied()))
            .flag("-sd", &[AxisValue::from(self.slack_dir)])
            .flag("-e", &typed(fleet.dvfs_flags()))
            .flag("-i", &[AxisValue::from(self.trace_dir(run).as_path())])
            .flag("-o", &[AxisValue::from(self.output_dir(run).as_path())])
            .flag("-m", &typed(run.machines_per_dc.iter().copied()))
            .flag("-dcs", &[AxisValue::from(run.datacenters)])
            .flag("--task-order-policy", &typed(&run.task_selection_policies))
            .flag(
                "--task-placement-policy",
                &[AxisValue::from(&run.placement_policy)],
            )
    }
}
