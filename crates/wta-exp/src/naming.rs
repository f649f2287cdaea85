//! Run identity: the directory name every run writes its output under.
//!
//! `{trace}_tpp_{placement}_dcs_{datacenters}_roundRobin`. The datacenter
//! count is an integer, so the last `_dcs_` in a name always separates the
//! placement policy from the count and distinct (placement, count) pairs never
//! collide for one trace.

use wta_core::errors::{ErrorInfo, SweepError};

const PLACEMENT_MARKER: &str = "_tpp_";
const DATACENTER_MARKER: &str = "_dcs_";
const SUFFIX: &str = "_roundRobin";

/// Rejects values that cannot be a single path component.
pub fn validate_component(kind: &str, value: &str) -> Result<(), SweepError> {
    let reason = if value.is_empty() {
        Some("value is empty")
    } else if value == "." || value == ".." {
        Some("value is a relative path component")
    } else if value.contains('/') || value.contains('\\') {
        Some("value contains a path separator")
    } else if value.chars().any(char::is_control) {
        Some("value contains a control character")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SweepError::Naming(
            ErrorInfo::new("unsafe_value", reason)
                .with_context("kind", kind)
                .with_context("value", value.escape_debug().to_string()),
        )),
        None => Ok(()),
    }
}

/// Derives the experiment name for one run.
pub fn run_name(trace: &str, placement_policy: &str, datacenters: u32) -> Result<String, SweepError> {
    validate_component("trace", trace)?;
    validate_component("task_placement_policy", placement_policy)?;
    Ok(format!(
        "{trace}{PLACEMENT_MARKER}{placement_policy}{DATACENTER_MARKER}{datacenters}{SUFFIX}"
    ))
}

/// Recovers `(placement_policy, datacenters)` from a name built for `trace`.
pub fn parse_run_name(trace: &str, name: &str) -> Option<(String, u32)> {
    let rest = name
        .strip_prefix(trace)?
        .strip_prefix(PLACEMENT_MARKER)?
        .strip_suffix(SUFFIX)?;
    let split = rest.rfind(DATACENTER_MARKER)?;
    let placement = &rest[..split];
    let datacenters = rest[split + DATACENTER_MARKER.len()..].parse().ok()?;
    Some((placement.to_string(), datacenters))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_established_name() {
        assert_eq!(
            run_name("pegasus_p7_parquet_bundle", "fastest_machine", 2).unwrap(),
            "pegasus_p7_parquet_bundle_tpp_fastest_machine_dcs_2_roundRobin"
        );
    }

    #[test]
    fn separators_are_rejected() {
        let err = run_name("traces/../etc", "fastest_machine", 1).unwrap_err();
        assert_eq!(err.code(), "unsafe_value");
        assert!(run_name("trace", "..", 1).is_err());
        assert!(run_name("trace", "", 1).is_err());
        assert!(run_name("trace", "look\nahead", 1).is_err());
    }

    #[test]
    fn marker_lookalikes_still_parse_back() {
        let name = run_name("t", "a_dcs_1", 2).unwrap();
        assert_eq!(parse_run_name("t", &name), Some(("a_dcs_1".to_string(), 2)));
    }
}
