use crate::core_types::AgentId;
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Square matrix stored row-major as nested vectors.
pub type Matrix = Vec<Vec<f64>>;

/// Tracks when each agent last replanned and derives how far apart two memorized lags are
/// in terms of population drift.
///
/// `distances()[r][s]` counts the agents that replanned at least once between the
/// snapshot at lag `r` and the snapshot at lag `s`.
#[derive(Debug, Clone)]
pub struct LagDistanceTracker {
    iteration: usize,
    // Most recent replan first.
    histories: HashMap<AgentId, VecDeque<usize>>,
    distances: Matrix,
}

impl Default for LagDistanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LagDistanceTracker {
    pub fn new() -> Self {
        Self {
            iteration: 0,
            histories: HashMap::new(),
            distances: vec![vec![0.0]],
        }
    }

    pub fn register_replanners<'a, I>(&mut self, replanner_ids: I, max_lag: usize)
    where
        I: IntoIterator<Item = &'a AgentId>,
    {
        self.iteration += 1;
        let iteration = self.iteration;
        let oldest_kept = iteration.saturating_sub(max_lag);

        for id in replanner_ids {
            self.histories.entry(*id).or_default().push_front(iteration);
        }
        self.histories.retain(|_, history| {
            while history.back().is_some_and(|&it| it < oldest_kept) {
                history.pop_back();
            }
            !history.is_empty()
        });

        let dim = max_lag.min(iteration) + 1;
        self.distances = self
            .histories
            .par_iter()
            .fold(
                || vec![vec![0.0; dim]; dim],
                |mut acc, (_, history)| {
                    accumulate_agent(&mut acc, history, iteration);
                    acc
                },
            )
            .reduce(
                || vec![vec![0.0; dim]; dim],
                |mut a, b| {
                    for (row_a, row_b) in a.iter_mut().zip(b.iter()) {
                        for (x, y) in row_a.iter_mut().zip(row_b.iter()) {
                            *x += *y;
                        }
                    }
                    a
                },
            );

        debug!(
            "Lag distances rebuilt: iteration={}, dim={}, tracked_agents={}",
            iteration,
            dim,
            self.histories.len()
        );
    }

    pub fn distances(&self) -> &Matrix {
        &self.distances
    }

    pub fn dim(&self) -> usize {
        self.distances.len()
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn tracked_agents(&self) -> usize {
        self.histories.len()
    }

    /// Retained replan lags of one agent, ascending.
    pub fn replan_lags(&self, agent: &AgentId) -> Vec<usize> {
        self.histories
            .get(agent)
            .map(|h| h.iter().map(|&it| self.iteration - it).collect())
            .unwrap_or_default()
    }
}

/// Adds one agent's binary "different" matrix to `acc`.
///
/// A replan at lag `l` happened after snapshot `l + 1` was taken and before snapshot `l`,
/// so it separates every pair `(r, s)` with `r <= l < s`.
fn accumulate_agent(acc: &mut Matrix, history: &VecDeque<usize>, iteration: usize) {
    let dim = acc.len();
    // History is newest first, so lags come out ascending.
    let lags: Vec<usize> = history
        .iter()
        .map(|&it| iteration - it)
        .filter(|&lag| lag + 1 < dim)
        .collect();
    if lags.is_empty() {
        return;
    }

    for r in 0..dim {
        let Some(&first_at_or_after) = lags.iter().find(|&&lag| lag >= r) else {
            break;
        };
        for s in (first_at_or_after + 1)..dim {
            acc[r][s] += 1.0;
            acc[s][r] += 1.0;
        }
    }
}
