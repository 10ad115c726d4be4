use super::golden::golden_section_minimize;
use crate::consts::{BANDWIDTH_DECAY_SPAN, EPSILON, GOLDEN_SECTION_TOLERANCE, MAX_BANDWIDTH};
use crate::error::{ReplanError, RpResult};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

// Fixed chunking keeps the floating-point summation order independent of thread scheduling.
const ROWS_PER_CHUNK: usize = 4096;

/// Outcome of one bandwidth tuning pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthFit {
    /// Relevance of each lag to the present, `compute_weights(0, optimal_mu, true)`.
    pub weights: Vec<f64>,
    pub min_mu: Option<f64>,
    pub max_mu: Option<f64>,
    pub optimal_mu: Option<f64>,
    /// Leave-one-out squared error at `optimal_mu`.
    pub objective: Option<f64>,
    pub evaluations: usize,
}

impl BandwidthFit {
    fn single_lag() -> Self {
        Self {
            weights: vec![1.0],
            min_mu: None,
            max_mu: None,
            optimal_mu: None,
            objective: None,
            evaluations: 0,
        }
    }
}

/// Cross-validated kernel smoother over memorized lags.
///
/// `data[n][r]` is agent `n`'s gap against the snapshot at lag `r`; `dist[r][s]` is the
/// population drift between lags `r` and `s`. Weights decay as `exp(-mu * dist)`.
pub struct KernelBandwidthOptimizer<'a> {
    data: &'a [Vec<f64>],
    dist: &'a [Vec<f64>],
    min_dist: Vec<f64>,
}

impl<'a> KernelBandwidthOptimizer<'a> {
    pub fn new(data: &'a [Vec<f64>], dist: &'a [Vec<f64>]) -> RpResult<Self> {
        let n = data.len();
        if n == 0 {
            return Err(ReplanError::config("gap matrix has no agents"));
        }
        let r = data[0].len();
        if r == 0 {
            return Err(ReplanError::config("gap matrix has no lags"));
        }
        if let Some((idx, row)) = data.iter().enumerate().find(|(_, row)| row.len() != r) {
            return Err(ReplanError::config(format!(
                "gap matrix row {} has {} lags, expected {}",
                idx,
                row.len(),
                r
            )));
        }
        if dist.len() != r {
            return Err(ReplanError::config(format!(
                "lag distance matrix has {} rows, gap matrix has {} lags",
                dist.len(),
                r
            )));
        }
        if let Some((idx, row)) = dist.iter().enumerate().find(|(_, row)| row.len() != r) {
            return Err(ReplanError::config(format!(
                "lag distance row {} has {} columns, expected {}",
                idx,
                row.len(),
                r
            )));
        }
        if data.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ReplanError::config("gap matrix contains non-finite entries"));
        }
        if dist.iter().flatten().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ReplanError::config(
                "lag distance matrix must be finite and non-negative",
            ));
        }

        let min_dist = (0..r)
            .map(|i| {
                (0..r)
                    .filter(|&j| j != i)
                    .map(|j| dist[i][j])
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        Ok(Self {
            data,
            dist,
            min_dist,
        })
    }

    pub fn lag_count(&self) -> usize {
        self.dist.len()
    }

    pub fn agent_count(&self) -> usize {
        self.data.len()
    }

    /// `[min_mu, max_mu]`, or `None` when there is a single lag.
    pub fn bandwidth_bounds(&self) -> Option<(f64, f64)> {
        if self.lag_count() < 2 {
            return None;
        }
        let max_min_dist = self.min_dist.iter().copied().fold(0.0, f64::max);
        // 10 / 0 is +inf, which the absolute cap absorbs.
        let max_mu = MAX_BANDWIDTH.min(BANDWIDTH_DECAY_SPAN / max_min_dist);
        Some((0.0, max_mu))
    }

    /// Normalized kernel weights around lag `i`.
    ///
    /// With `include_self = false` lag `i` gets zero weight and distances are offset by
    /// the nearest other lag, so the nearest neighbour always carries raw weight 1.
    pub fn compute_weights(&self, i: usize, mu: f64, include_self: bool) -> RpResult<Vec<f64>> {
        let r = self.lag_count();
        if i >= r {
            return Err(ReplanError::config(format!(
                "lag {} out of range for {} lags",
                i, r
            )));
        }
        if !include_self && r == 1 {
            return Err(ReplanError::config(
                "cannot exclude the only memorized lag from its own weights",
            ));
        }
        Ok(self.weights_unchecked(i, mu, include_self))
    }

    fn weights_unchecked(&self, i: usize, mu: f64, include_self: bool) -> Vec<f64> {
        let r = self.lag_count();
        let offset = if include_self { 0.0 } else { self.min_dist[i] };

        let mut weights: Vec<f64> = (0..r)
            .map(|j| {
                if j == i && !include_self {
                    0.0
                } else {
                    (-mu * (self.dist[i][j] - offset)).exp()
                }
            })
            .collect();

        let sum: f64 = weights.iter().sum();
        let denom = if sum.is_finite() && sum >= EPSILON {
            sum
        } else {
            warn!(
                "Kernel weight sum {:e} for lag {} at mu={} floored to {:e}",
                sum, i, mu, EPSILON
            );
            EPSILON
        };
        for w in weights.iter_mut() {
            *w /= denom;
        }
        weights
    }

    /// Leave-one-out squared prediction error summed over lags and agents.
    pub fn err2(&self, mu: f64) -> f64 {
        let r = self.lag_count();
        let loo: Vec<Vec<f64>> = (0..r)
            .map(|i| self.weights_unchecked(i, mu, false))
            .collect();

        let partials: Vec<f64> = self
            .data
            .par_chunks(ROWS_PER_CHUNK)
            .map(|rows| {
                let mut acc = 0.0;
                for row in rows {
                    for (i, w) in loo.iter().enumerate() {
                        let predicted: f64 = w.iter().zip(row.iter()).map(|(a, b)| a * b).sum();
                        let residual = row[i] - predicted;
                        acc += residual * residual;
                    }
                }
                acc
            })
            .collect();

        partials.iter().sum()
    }

    /// Tunes `mu` by golden-section search on [`Self::err2`] and returns the resulting
    /// weights relative to the most recent lag.
    pub fn optimize(&self) -> RpResult<BandwidthFit> {
        let Some((min_mu, max_mu)) = self.bandwidth_bounds() else {
            return Ok(BandwidthFit::single_lag());
        };

        let res = golden_section_minimize(
            |mu| self.err2(mu),
            min_mu,
            max_mu,
            GOLDEN_SECTION_TOLERANCE,
        );
        let weights = self.compute_weights(0, res.argmin, true)?;

        debug!(
            "Bandwidth tuned: mu={:.6} in [{}, {}], err2={:.6}, evals={}",
            res.argmin, min_mu, max_mu, res.value, res.evaluations
        );

        Ok(BandwidthFit {
            weights,
            min_mu: Some(min_mu),
            max_mu: Some(max_mu),
            optimal_mu: Some(res.argmin),
            objective: Some(res.value),
            evaluations: res.evaluations,
        })
    }
}
