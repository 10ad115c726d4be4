mod common;

use common::assert_close;
use replanforge::config::{ReplanConfig, StepControl};
use replanforge::stepsize::{ScheduleBounds, StepSizeSchedule};
use rstest::rstest;

fn bounds(first: usize, last: usize, f: f64, n: usize) -> ScheduleBounds {
    ScheduleBounds {
        first_iteration: first,
        last_iteration: last,
        initial_step_size_factor: f,
        population_size: n,
    }
}

#[rstest]
#[case(0, 10, 0.1, 100)]
#[case(5, 50, 0.25, 40)]
#[case(0, 1, 0.5, 3)]
#[case(100, 400, 0.02, 1_000_000)]
fn test_exp_hits_both_endpoints(
    #[case] first: usize,
    #[case] last: usize,
    #[case] f: f64,
    #[case] n: usize,
) {
    let s = StepSizeSchedule::new(StepControl::Exp, bounds(first, last, f, n), -1.0).unwrap();
    let n = n as f64;
    assert_close(s.step_size(first), f * n, 1e-9 * n);
    assert_close(s.step_size(last), n, 1e-9 * n);
    assert_close(s.replanning_rate(last, n as usize), 1.0, 1e-9);
}

#[test]
fn test_exp_grows_monotonically() {
    let s = StepSizeSchedule::new(StepControl::Exp, bounds(0, 20, 0.1, 500), 0.0).unwrap();
    let steps: Vec<f64> = (0..=20).map(|it| s.step_size(it)).collect();
    assert!(steps.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_msa_decays_like_one_over_n() {
    let s = StepSizeSchedule::new(StepControl::Msa, bounds(0, 10, 1.0, 100), -1.0).unwrap();
    assert_close(s.step_size(0), 100.0, 1e-12);
    assert_close(s.step_size(1), 50.0, 1e-12);
    assert_close(s.step_size(3), 25.0, 1e-12);
    assert_close(s.replanning_rate(9, 100), 0.1, 1e-12);
}

#[test]
fn test_msa_accepts_a_single_iteration_run() {
    assert!(StepSizeSchedule::new(StepControl::Msa, bounds(3, 3, 0.5, 10), -0.5).is_ok());
}

#[test]
fn test_rate_is_clamped() {
    let s = StepSizeSchedule::new(StepControl::Msa, bounds(0, 10, 2.0, 10), 0.0).unwrap();
    assert_eq!(s.step_size(4), 20.0);
    assert_eq!(s.replanning_rate(4, 10), 1.0);
    assert_eq!(s.replanning_rate(4, 0), 0.0);
}

#[rstest]
#[case::exp_without_span(StepControl::Exp, bounds(4, 4, 0.1, 10))]
#[case::exp_reversed(StepControl::Exp, bounds(9, 4, 0.1, 10))]
#[case::empty_population(StepControl::Msa, bounds(0, 10, 0.1, 0))]
#[case::zero_factor(StepControl::Msa, bounds(0, 10, 0.0, 10))]
#[case::negative_factor(StepControl::Exp, bounds(0, 10, -0.5, 10))]
fn test_invalid_bounds(#[case] control: StepControl, #[case] b: ScheduleBounds) {
    let err = StepSizeSchedule::new(control, b, -1.0).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_from_config_uses_run_bounds() {
    let cfg = ReplanConfig {
        first_iteration: 2,
        last_iteration: 12,
        initial_step_size_factor: 0.2,
        ..Default::default()
    };
    let s = StepSizeSchedule::from_config(&cfg, 50).unwrap();
    assert_close(s.step_size(2), 10.0, 1e-9);
    assert_close(s.step_size(12), 50.0, 1e-9);
}
