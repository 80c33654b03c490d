use std::io::Write;

use chrono::NaiveTime;

use openrange::{
    AnalysisConfig, AnalysisConfigPatch, AnalysisError, AnalysisProfileConfig, DataError,
    StopPolicy,
};

#[test]
fn defaults_are_valid() {
    let config = AnalysisConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.levels.multipliers, [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(
        config.session.open_time,
        NaiveTime::from_hms_opt(9, 30, 0).expect("valid time")
    );
    assert_eq!(config.signal.stop_policy, StopPolicy::RangeFraction(0.5));
}

#[test]
fn yaml_overrides_only_the_given_fields() {
    let config = AnalysisConfig::from_yaml_str(
        r#"
open_time: "08:30"
multipliers: [0.5, 1, 1.5, 2]
tolerance_bps: 10
stop_policy: next_level
"#,
    )
    .expect("valid yaml");

    assert_eq!(
        config.session.open_time,
        NaiveTime::from_hms_opt(8, 30, 0).expect("valid time")
    );
    assert_eq!(config.levels.multipliers, [0.5, 1.0, 1.5, 2.0]);
    assert!((config.reaction.tolerance_bps - 10.0).abs() < 1e-9);
    assert_eq!(config.reaction.lookahead, 6);
    assert_eq!(config.signal.stop_policy, StopPolicy::NextLevel);
    assert!((config.signal.risk_reward - 2.0).abs() < 1e-9);
}

#[test]
fn range_fraction_can_be_tuned_alone() {
    let patch = AnalysisConfigPatch {
        stop_range_fraction: Some(0.25),
        ..AnalysisConfigPatch::default()
    };
    let config = AnalysisConfig::default()
        .apply_patch(&patch)
        .expect("valid patch");
    assert_eq!(config.signal.stop_policy, StopPolicy::RangeFraction(0.25));
}

#[test]
fn unsorted_multipliers_are_rejected() {
    let err = AnalysisConfig::from_yaml_str("multipliers: [1, 3, 2, 4]\n")
        .expect_err("must be ascending");
    assert!(matches!(
        err,
        DataError::Analysis(AnalysisError::InvalidConfig(_))
    ));
}

#[test]
fn bad_values_are_rejected() {
    for yaml in [
        "tolerance_bps: -1\n",
        "lookahead: 0\n",
        "confidence_threshold: 1.5\n",
        "risk_reward: 0\n",
        "stop_policy: trailing\n",
        "open_time: \"9am\"\n",
    ] {
        let result = AnalysisConfig::from_yaml_str(yaml);
        assert!(
            matches!(result, Err(DataError::Analysis(AnalysisError::InvalidConfig(_)))),
            "{yaml} should be refused"
        );
    }
}

#[test]
fn malformed_yaml_is_a_data_error() {
    let result = AnalysisConfig::from_yaml_str("lookahead: [oops\n");
    assert!(matches!(result, Err(DataError::Yaml(_))));
}

#[test]
fn profile_symbol_patch_layers_over_default() {
    let profile = AnalysisProfileConfig::from_yaml_str(
        r#"
default:
  confidence_threshold: 0.7
  scan_window: 60
symbol:
  CL:
    confidence_threshold: 0.8
    stop_policy: next_level
"#,
    )
    .expect("valid yaml");

    let cl = profile.resolve_for("cl").expect("valid profile");
    assert!((cl.signal.confidence_threshold - 0.8).abs() < 1e-9);
    assert_eq!(cl.signal.scan_window, 60);
    assert_eq!(cl.signal.stop_policy, StopPolicy::NextLevel);

    let es = profile.resolve_for("ES").expect("valid profile");
    assert!((es.signal.confidence_threshold - 0.7).abs() < 1e-9);
    assert_eq!(es.signal.stop_policy, StopPolicy::RangeFraction(0.5));
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "min_touches: 3").expect("write yaml");
    writeln!(file, "risk_reward: 1.5").expect("write yaml");

    let config = AnalysisConfig::from_yaml_file(file.path()).expect("valid file");
    assert_eq!(config.signal.min_touches, 3);
    assert!((config.signal.risk_reward - 1.5).abs() < 1e-9);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = AnalysisConfig::from_yaml_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(DataError::Io(_))));
}
