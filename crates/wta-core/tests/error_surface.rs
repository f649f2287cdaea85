use wta_core::errors::{ErrorInfo, SweepError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("path", "/tmp/out")
        .with_context("axis", "datacenters")
}

#[test]
fn config_error_surface() {
    let err = SweepError::Config(sample_info("fleet_length_mismatch", "fleet lists differ"));
    assert_eq!(err.code(), "fleet_length_mismatch");
    assert!(err.info().context.contains_key("axis"));
}

#[test]
fn naming_error_surface() {
    let err = SweepError::Naming(sample_info("unsafe_value", "path separator"));
    assert_eq!(err.info().code, "unsafe_value");
    assert!(err.to_string().starts_with("naming error: path separator"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = SweepError::Discovery(
        ErrorInfo::new("trace_root_read", "no such directory")
            .with_context("root", "/data/traces")
            .with_hint("check trace_root in the plan"),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("code: trace_root_read"));
    assert!(rendered.contains("root=/data/traces"));
    assert!(rendered.contains("hint: check trace_root in the plan"));
}

#[test]
fn errors_roundtrip_through_json() {
    let err = SweepError::Dispatch(sample_info("non_zero_exit", "exit status 1"));
    let json = serde_json::to_string(&err).expect("encode");
    assert!(json.contains("\"family\":\"Dispatch\""));
    let back: SweepError = serde_json::from_str(&json).expect("decode");
    assert_eq!(back, err);
}
