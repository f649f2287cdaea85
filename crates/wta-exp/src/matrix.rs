use serde::Serialize;
use wta_core::errors::{ErrorInfo, SweepError};

use crate::axes::{AxisSet, Combination, DATACENTERS, TASK_PLACEMENT_POLICIES, VARYING_AXES};
use crate::fleet::FleetSpec;
use crate::naming::run_name;

/// One fully resolved point of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSpec {
    pub trace: String,
    pub placement_policy: String,
    pub datacenters: u32,
    pub fleet: FleetSpec,
    pub machines_per_dc: Vec<u32>,
    pub task_selection_policies: Vec<String>,
    name: String,
}

impl RunSpec {
    /// Experiment name, also the output directory name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Values every run of a sweep shares.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedAxes<'a> {
    pub fleet: &'a FleetSpec,
    pub machines_per_dc: &'a [u32],
    pub task_selection_policies: &'a [String],
}

fn combination_error(axis: &str, message: &str) -> SweepError {
    SweepError::Axis(ErrorInfo::new("invalid_axis_value", message).with_context("axis", axis))
}

fn placement_of(combination: &Combination) -> Result<String, SweepError> {
    combination
        .get(TASK_PLACEMENT_POLICIES)
        .and_then(|value| value.as_text())
        .map(str::to_string)
        .ok_or_else(|| combination_error(TASK_PLACEMENT_POLICIES, "expected a policy name"))
}

fn datacenters_of(combination: &Combination) -> Result<u32, SweepError> {
    combination
        .get(DATACENTERS)
        .and_then(|value| value.as_int())
        .and_then(|count| u32::try_from(count).ok())
        .filter(|count| *count > 0)
        .ok_or_else(|| combination_error(DATACENTERS, "expected a positive datacenter count"))
}

/// Expands the varying axes of `axes` into run specs for `trace`, placement
/// policy outermost and datacenter count varying fastest.
pub fn expand_runs(
    trace: &str,
    axes: &AxisSet,
    fixed: &FixedAxes<'_>,
) -> Result<Vec<RunSpec>, SweepError> {
    axes.product(&VARYING_AXES)?
        .iter()
        .map(|combination| {
            let placement_policy = placement_of(combination)?;
            let datacenters = datacenters_of(combination)?;
            let name = run_name(trace, &placement_policy, datacenters)?;
            Ok(RunSpec {
                trace: trace.to_string(),
                placement_policy,
                datacenters,
                fleet: fixed.fleet.clone(),
                machines_per_dc: fixed.machines_per_dc.to_vec(),
                task_selection_policies: fixed.task_selection_policies.to_vec(),
                name,
            })
        })
        .collect()
}
