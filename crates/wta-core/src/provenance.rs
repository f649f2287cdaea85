//! Provenance attached to persisted sweep reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Layout version of a persisted sweep report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    /// Layout written by this release.
    pub const CURRENT: SchemaVersion = SchemaVersion(1);
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// When and from which plan a sweep report was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Digest of the sweep plan.
    pub plan_hash: String,
    /// Report layout version.
    pub schema: SchemaVersion,
    /// RFC 3339 start of the sweep.
    pub started_at: String,
    /// RFC 3339 end of the sweep.
    pub finished_at: String,
    /// Crate name to version for the tooling that ran the sweep.
    pub tool_versions: BTreeMap<String, String>,
}
