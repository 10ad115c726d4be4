mod common;

use common::assert_close;
use fastrand::Rng;
use replanforge::kernel::{BandwidthSmoother, KernelBandwidthOptimizer};
use rstest::rstest;

/// Lags (0, 1) and (2, 3) are close, every other pair is far.
fn paired_distances() -> Vec<Vec<f64>> {
    let mut d = vec![vec![3.0; 4]; 4];
    for i in 0..4 {
        d[i][i] = 0.0;
    }
    d[0][1] = 1.0;
    d[1][0] = 1.0;
    d[2][3] = 1.0;
    d[3][2] = 1.0;
    d
}

fn random_gaps(rng: &mut Rng, n: usize, r: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| (0..r).map(|_| rng.f64() * 2.0 - 1.0).collect())
        .collect()
}

#[test]
fn test_single_lag_falls_back_to_unit_weight() {
    let data = vec![vec![0.3], vec![-1.2]];
    let dist = vec![vec![0.0]];
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();

    assert!(opt.bandwidth_bounds().is_none());
    let fit = opt.optimize().unwrap();
    assert_eq!(fit.weights, vec![1.0]);
    assert!(fit.optimal_mu.is_none());
    assert!(fit.min_mu.is_none() && fit.max_mu.is_none());

    // Nothing left to predict from
    assert!(opt.compute_weights(0, 1.0, false).unwrap_err().is_config());
    assert_eq!(opt.compute_weights(0, 1.0, true).unwrap(), vec![1.0]);
}

#[rstest]
#[case::no_agents(vec![], vec![vec![0.0]])]
#[case::no_lags(vec![vec![]], vec![])]
#[case::ragged_rows(vec![vec![1.0, 2.0], vec![1.0]], vec![vec![0.0, 1.0], vec![1.0, 0.0]])]
#[case::dist_too_small(vec![vec![1.0, 2.0]], vec![vec![0.0]])]
#[case::dist_not_square(vec![vec![1.0, 2.0]], vec![vec![0.0, 1.0], vec![1.0]])]
#[case::negative_dist(vec![vec![1.0, 2.0]], vec![vec![0.0, -1.0], vec![-1.0, 0.0]])]
#[case::nan_gap(vec![vec![f64::NAN, 2.0]], vec![vec![0.0, 1.0], vec![1.0, 0.0]])]
fn test_inconsistent_input_is_a_configuration_error(
    #[case] data: Vec<Vec<f64>>,
    #[case] dist: Vec<Vec<f64>>,
) {
    let err = KernelBandwidthOptimizer::new(&data, &dist).err().unwrap();
    assert!(err.is_config(), "unexpected error kind: {}", err);
}

#[test]
fn test_bandwidth_bounds_follow_nearest_neighbour_distance() {
    let data = vec![vec![0.0; 3]];
    let dist = vec![
        vec![0.0, 2.0, 4.0],
        vec![2.0, 0.0, 1.0],
        vec![4.0, 1.0, 0.0],
    ];
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();
    // minDist = [2, 1, 1], so maxMu = 10 / 2
    assert_eq!(opt.bandwidth_bounds(), Some((0.0, 5.0)));
}

#[test]
fn test_bandwidth_cap_without_drift() {
    let data = vec![vec![1.0, 1.0]];
    let dist = vec![vec![0.0; 2]; 2];
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();
    assert_eq!(opt.bandwidth_bounds(), Some((0.0, 1e6)));

    let fit = opt.optimize().unwrap();
    assert_close(fit.weights[0], 0.5, 1e-12);
    assert_close(fit.weights[1], 0.5, 1e-12);
}

#[rstest]
#[case(0.0)]
#[case(0.7)]
#[case(10.0)]
#[case(1e6)]
fn test_weights_are_a_distribution(#[case] mu: f64) {
    let mut rng = Rng::with_seed(11);
    let data = random_gaps(&mut rng, 5, 4);
    let dist = paired_distances();
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();

    for i in 0..4 {
        for include_self in [true, false] {
            let w = opt.compute_weights(i, mu, include_self).unwrap();
            assert_eq!(w.len(), 4);
            assert!(w.iter().all(|&x| x >= 0.0));
            assert_close(w.iter().sum(), 1.0, 1e-9);
            if !include_self {
                assert_eq!(w[i], 0.0);
            }
        }
    }
}

#[test]
fn test_excluded_lag_shifts_mass_to_nearest_neighbour() {
    let data = vec![vec![0.0; 4]];
    let dist = paired_distances();
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();

    let w = opt.compute_weights(0, 2.0, false).unwrap();
    let far = (-4.0f64).exp();
    let norm = 1.0 + 2.0 * far;
    assert_close(w[1], 1.0 / norm, 1e-12);
    assert_close(w[2], far / norm, 1e-12);
    assert_close(w[3], far / norm, 1e-12);
}

#[test]
fn test_out_of_range_lag() {
    let data = vec![vec![0.0; 4]];
    let dist = paired_distances();
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();
    assert!(opt.compute_weights(4, 1.0, true).unwrap_err().is_config());
}

#[test]
fn test_optimal_weights_are_reproducible() {
    let mut rng = Rng::with_seed(3);
    let data = random_gaps(&mut rng, 8, 4);
    let dist = paired_distances();
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();

    let fit = opt.optimize().unwrap();
    let mu = fit.optimal_mu.unwrap();
    assert_eq!(opt.compute_weights(0, mu, true).unwrap(), fit.weights);
    assert_eq!(opt.optimize().unwrap(), fit);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(17)]
#[case(4711)]
fn test_golden_section_matches_grid_search(#[case] seed: u64) {
    let mut rng = Rng::with_seed(seed);
    let data = random_gaps(&mut rng, 5, 4);
    let dist = paired_distances();
    let opt = KernelBandwidthOptimizer::new(&data, &dist).unwrap();

    let (lo, hi) = opt.bandwidth_bounds().unwrap();
    assert_eq!((lo, hi), (0.0, 10.0));

    let steps = 10_000;
    let grid_min = (0..=steps)
        .map(|k| opt.err2(lo + (hi - lo) * k as f64 / steps as f64))
        .fold(f64::INFINITY, f64::min);

    let fit = opt.optimize().unwrap();
    let mu = fit.optimal_mu.unwrap();
    assert!((lo..=hi).contains(&mu));
    assert_close(opt.err2(mu), grid_min, 1e-3);
    assert_close(fit.objective.unwrap(), opt.err2(mu), 1e-12);
}

#[test]
fn test_smoother_passes_first_value_then_blends() {
    let mut s = BandwidthSmoother::new(0.5);
    assert_eq!(s.current(), None);
    assert_eq!(s.update(4.0), 4.0);
    assert_eq!(s.update(2.0), 3.0);

    let mut frozen = BandwidthSmoother::new(1.0);
    frozen.update(7.0);
    assert_eq!(frozen.update(1.0), 7.0);
}
