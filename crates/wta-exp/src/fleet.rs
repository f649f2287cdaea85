use serde::{Deserialize, Serialize};
use wta_core::errors::{ErrorInfo, SweepError};

/// Machine types simulated in every datacenter, one list entry per type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSpec {
    /// Logical cores per machine type (`-c`).
    pub resources: Vec<u32>,
    /// Thermal design power in watts (`-t`).
    pub tdps: Vec<u32>,
    /// Base clock in GHz (`-bc`).
    pub base_clocks: Vec<f64>,
    /// Share of the fleet served by each machine type (`-mf`).
    pub fractions: Vec<f64>,
    /// DVFS switch applied to every machine type (`-e`).
    #[serde(default)]
    pub dvfs: bool,
}

impl FleetSpec {
    /// The DVFS switch broadcast to one value per machine type, so the `-e`
    /// argument count always matches `-c`.
    pub fn dvfs_flags(&self) -> Vec<bool> {
        vec![self.dvfs; self.resources.len()]
    }

    /// Checks that every per-type list lines up with `resources`.
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.resources.is_empty() {
            return Err(SweepError::Config(
                ErrorInfo::new("empty_fleet", "fleet must describe at least one machine type")
                    .with_hint("set fleet.resources"),
            ));
        }
        let expected = self.resources.len();
        for (field, len) in [
            ("tdps", self.tdps.len()),
            ("base_clocks", self.base_clocks.len()),
            ("fractions", self.fractions.len()),
        ] {
            if len != expected {
                return Err(SweepError::Config(
                    ErrorInfo::new(
                        "fleet_length_mismatch",
                        "per machine type lists must match fleet.resources",
                    )
                    .with_context("field", field)
                    .with_context("expected", expected.to_string())
                    .with_context("found", len.to_string()),
                ));
            }
        }
        Ok(())
    }
}
