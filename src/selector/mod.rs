pub mod gapprop;
pub mod msa;
pub mod sbayti;

use crate::config::{ReplanConfig, ReplannerIdentifier};
use crate::core_types::{AgentId, ReplannerSet};
use crate::error::{ReplanError, RpResult};
use fastrand::Rng;
use std::cmp::Ordering;

/// One agent's cycle summary, as seen by the admission policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedAgent {
    pub id: AgentId,
    pub weighted_gap: f64,
    pub weighted_old_score: f64,
}

/// Admitted set plus the threshold it was admitted against.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub replanners: ReplannerSet,
    pub gap_threshold: f64,
    /// Mean weighted gap over the admitted agents, 0 when nobody was admitted.
    pub mean_admitted_gap: f64,
}

/// Number of agents a rate of `rate` admits out of `n`.
pub fn admission_count(rate: f64, n: usize) -> usize {
    let target = (rate.clamp(0.0, 1.0) * n as f64 + 1e-9).floor() as usize;
    target.min(n)
}

/// Shuffles, then stable-sorts by weighted gap, descending. Ties keep their shuffled order,
/// so no agent is systematically favoured by its position in the population.
pub fn rank_agents(mut agents: Vec<RankedAgent>, rng: &mut Rng) -> Vec<RankedAgent> {
    rng.shuffle(&mut agents);
    agents.sort_by(|a, b| {
        b.weighted_gap
            .partial_cmp(&a.weighted_gap)
            .unwrap_or(Ordering::Equal)
    });
    agents
}

/// Turns ranked gaps plus a target replanning rate into a concrete replanner set.
///
/// Keeps the running mean of admitted gaps that the threshold sub-mode of SBAYTI2007 is
/// derived from.
pub struct ReplannerSelector {
    policy: ReplannerIdentifier,
    using_threshold: bool,
    first_iteration: usize,
    last_iteration: usize,
    running_mean_gap: f64,
    gap_threshold: f64,
    rng: Rng,
}

impl ReplannerSelector {
    pub fn new(cfg: &ReplanConfig) -> RpResult<Self> {
        if cfg.is_gap_weighting {
            return Err(ReplanError::config(
                "is_gap_weighting = true is not supported by any replanner policy",
            ));
        }
        Ok(Self {
            policy: cfg.replanner_identifier,
            using_threshold: cfg.is_using_threshold,
            first_iteration: cfg.first_iteration,
            last_iteration: cfg.last_iteration,
            running_mean_gap: 0.0,
            gap_threshold: 0.0,
            rng: Rng::with_seed(cfg.seed),
        })
    }

    pub fn policy(&self) -> ReplannerIdentifier {
        self.policy
    }

    pub fn gap_threshold(&self) -> f64 {
        self.gap_threshold
    }

    pub fn running_mean_gap(&self) -> f64 {
        self.running_mean_gap
    }

    pub fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    pub fn rank(&mut self, agents: Vec<RankedAgent>) -> Vec<RankedAgent> {
        rank_agents(agents, &mut self.rng)
    }

    /// `ranked` must be sorted by weighted gap, descending (see [`rank_agents`]).
    pub fn select(&mut self, ranked: &[RankedAgent], rate: f64) -> Selection {
        let rate = rate.clamp(0.0, 1.0);
        let admitted: Vec<&RankedAgent> = match self.policy {
            ReplannerIdentifier::Msa => msa::select(ranked, rate, &mut self.rng),
            ReplannerIdentifier::Sbayti2007 if self.using_threshold => {
                sbayti::select_by_threshold(ranked, self.gap_threshold)
            }
            ReplannerIdentifier::Sbayti2007 => sbayti::select_by_rank(ranked, rate),
            ReplannerIdentifier::GapProp => gapprop::select(ranked, rate, &mut self.rng),
        };

        let mean_admitted_gap = if admitted.is_empty() {
            0.0
        } else {
            admitted.iter().map(|a| a.weighted_gap).sum::<f64>() / admitted.len() as f64
        };

        Selection {
            replanners: admitted.iter().map(|a| a.id).collect(),
            gap_threshold: self.gap_threshold,
            mean_admitted_gap,
        }
    }

    /// Folds a committed cycle into the running statistics and derives the threshold the
    /// next cycle admits against.
    pub fn update_statistics(&mut self, iteration: usize, rate: f64, mean_admitted_gap: f64) {
        let rate = rate.clamp(0.0, 1.0);
        self.running_mean_gap = (1.0 - rate) * self.running_mean_gap + rate * mean_admitted_gap;
        self.gap_threshold = self.progress_fraction(iteration) * self.running_mean_gap;
    }

    pub fn progress_fraction(&self, iteration: usize) -> f64 {
        if self.last_iteration <= self.first_iteration {
            return 1.0;
        }
        let done = iteration.saturating_sub(self.first_iteration) as f64;
        let span = (self.last_iteration - self.first_iteration) as f64;
        (done / span).clamp(0.0, 1.0)
    }
}
