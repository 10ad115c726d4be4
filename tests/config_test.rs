use clap::{CommandFactory, FromArgMatches, Parser};
use replanforge::config::{ReplanConfig, ReplannerIdentifier, StepControl};
use replanforge::error::ReplanError;
use rstest::rstest;
use strum::IntoEnumIterator;
use tempfile::tempdir;

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    config: ReplanConfig,
}

#[test]
fn test_defaults() {
    let cfg = ReplanConfig::default();
    assert_eq!(cfg.max_memory, 5);
    assert_eq!(cfg.max_lag(), 4);
    assert_eq!(cfg.smoothing_inertia, 0.0);
    assert_eq!(cfg.step_control, StepControl::Exp);
    assert_eq!(cfg.replanner_identifier, ReplannerIdentifier::Sbayti2007);
    assert!(!cfg.is_using_threshold);
    assert!(!cfg.is_gap_weighting);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_clap_defaults_match_default_impl() {
    let cli = TestCli::try_parse_from(["test"]).unwrap();
    let d = ReplanConfig::default();
    assert_eq!(cli.config.max_memory, d.max_memory);
    assert_eq!(cli.config.step_control, d.step_control);
    assert_eq!(cli.config.initial_step_size_factor, d.initial_step_size_factor);
    assert_eq!(
        cli.config.replanning_rate_iteration_exponent,
        d.replanning_rate_iteration_exponent
    );
    assert_eq!(cli.config.last_iteration, d.last_iteration);
    assert_eq!(cli.config.seed, d.seed);
}

#[test]
fn test_enum_names_parse_case_insensitively() {
    assert_eq!(
        "sbayti2007".parse::<ReplannerIdentifier>().unwrap(),
        ReplannerIdentifier::Sbayti2007
    );
    assert_eq!("msa".parse::<StepControl>().unwrap(), StepControl::Msa);
    for id in ReplannerIdentifier::iter() {
        assert_eq!(id.to_string().parse::<ReplannerIdentifier>().unwrap(), id);
    }

    let err: ReplanError = "GREEDY".parse::<ReplannerIdentifier>().unwrap_err().into();
    assert!(err.is_config());
}

#[test]
fn test_json_round_trip_and_partial_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("replan.json");

    let cfg = ReplanConfig {
        max_memory: 7,
        step_control: StepControl::Msa,
        replanner_identifier: ReplannerIdentifier::GapProp,
        ..Default::default()
    };
    cfg.save_to_file(&path).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"GAPPROP\""));

    let loaded = ReplanConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded.max_memory, 7);
    assert_eq!(loaded.replanner_identifier, ReplannerIdentifier::GapProp);

    std::fs::write(&path, r#"{ "max_memory": 2, "is_using_threshold": true }"#).unwrap();
    let partial = ReplanConfig::load_from_file(&path).unwrap();
    assert_eq!(partial.max_memory, 2);
    assert!(partial.is_using_threshold);
    assert_eq!(partial.last_iteration, ReplanConfig::default().last_iteration);
}

#[test]
fn test_unknown_enum_in_json_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "step_control": "LINEAR" }"#).unwrap();
    assert!(matches!(
        ReplanConfig::load_from_file(&path),
        Err(ReplanError::Json(_))
    ));
}

#[rstest]
#[case::zero_memory(|c: &mut ReplanConfig| c.max_memory = 0)]
#[case::inertia_above_one(|c: &mut ReplanConfig| c.smoothing_inertia = 1.5)]
#[case::non_positive_factor(|c: &mut ReplanConfig| c.initial_step_size_factor = 0.0)]
#[case::nan_exponent(|c: &mut ReplanConfig| c.replanning_rate_iteration_exponent = f64::NAN)]
#[case::reversed_bounds(|c: &mut ReplanConfig| c.first_iteration = c.last_iteration + 1)]
#[case::exp_without_span(|c: &mut ReplanConfig| c.first_iteration = c.last_iteration)]
#[case::gap_weighting(|c: &mut ReplanConfig| c.is_gap_weighting = true)]
fn test_validation_rejects(#[case] tweak: fn(&mut ReplanConfig)) {
    let mut cfg = ReplanConfig::default();
    tweak(&mut cfg);
    assert!(cfg.validate().unwrap_err().is_config());
}

#[test]
fn test_msa_allows_single_iteration_run() {
    let cfg = ReplanConfig {
        step_control: StepControl::Msa,
        first_iteration: 3,
        last_iteration: 3,
        ..Default::default()
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_merge_only_takes_explicit_flags() {
    let matches = TestCli::command().get_matches_from([
        "test",
        "--max-memory",
        "9",
        "--replanner-identifier",
        "GAPPROP",
        "--replanning-rate-iteration-exponent",
        "-0.5",
    ]);
    let cli = TestCli::from_arg_matches(&matches).unwrap();

    let mut base = ReplanConfig {
        max_memory: 3,
        seed: 1,
        last_iteration: 40,
        ..Default::default()
    };
    base.merge_from_cli(&cli.config, &matches);

    assert_eq!(base.max_memory, 9);
    assert_eq!(base.replanner_identifier, ReplannerIdentifier::GapProp);
    assert_eq!(base.replanning_rate_iteration_exponent, -0.5);
    // Untouched on the command line, so the file values survive
    assert_eq!(base.seed, 1);
    assert_eq!(base.last_iteration, 40);
}
