use proptest::prelude::*;
use wta_exp::{parse_run_name, run_name};

fn policy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("fastest_machine".to_string()),
        Just("look_ahead".to_string()),
        Just("best_fit".to_string()),
        "[a-z][a-z_]{0,12}",
        // Policies that embed the markers themselves.
        "[a-z]{1,4}_dcs_[0-9]{1,2}",
        "[a-z]{1,4}_tpp_[a-z]{1,4}",
    ]
}

proptest! {
    #[test]
    fn distinct_pairs_never_share_a_name(
        trace in "[a-z0-9_]{1,16}",
        a in (policy(), 1u32..64),
        b in (policy(), 1u32..64),
    ) {
        let name_a = run_name(&trace, &a.0, a.1).unwrap();
        let name_b = run_name(&trace, &b.0, b.1).unwrap();
        prop_assert_eq!(name_a == name_b, a == b);
    }

    #[test]
    fn names_parse_back_to_their_inputs(
        trace in "[a-z0-9_]{1,16}",
        placement in policy(),
        datacenters in 1u32..1000,
    ) {
        let name = run_name(&trace, &placement, datacenters).unwrap();
        prop_assert_eq!(parse_run_name(&trace, &name), Some((placement, datacenters)));
    }
}

#[test]
fn path_like_values_are_rejected() {
    for bad in ["", ".", "..", "a/b", "a\\b", "tab\there"] {
        let err = run_name("trace", bad, 2).expect_err(bad);
        assert_eq!(err.code(), "unsafe_value");
    }
    assert_eq!(run_name("../etc", "fastest_machine", 2).unwrap_err().code(), "unsafe_value");
}
