use crate::api::{Agent, Evaluator, PlanGenerator, SnapshotProvider};
use crate::coordinator::{IterationStats, ReplanCoordinator};
use crate::error::RpResult;
use std::time::Instant;
use tracing::{info, warn};

/// Receives every committed cycle. Returning `false` stops the run after that iteration.
pub trait ProgressCallback {
    fn on_iteration(&self, stats: &IterationStats) -> bool;
}

impl<F> ProgressCallback for F
where
    F: Fn(&IterationStats) -> bool,
{
    fn on_iteration(&self, stats: &IterationStats) -> bool {
        self(stats)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub iterations: Vec<IterationStats>,
    /// Cycles that failed after a snapshot was memorized; agents kept their plans.
    pub aborted_cycles: usize,
    pub stopped_early: bool,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn total_replans(&self) -> usize {
        self.iterations.iter().map(|s| s.replanner_count).sum()
    }
}

/// The outer simulation loop: mobility run, snapshot, replanning, repeated over the
/// configured iteration range.
///
/// Evaluation failures abort only the affected cycle. Configuration errors end the run.
pub fn run<G, E, S, CB>(
    coordinator: &mut ReplanCoordinator<G, E>,
    provider: &mut S,
    agents: &mut [Agent<G::Plan>],
    callback: CB,
) -> RpResult<RunSummary>
where
    G: PlanGenerator,
    E: Evaluator<G::Plan>,
    S: SnapshotProvider<G::Plan>,
    CB: ProgressCallback,
{
    let first = coordinator.iteration();
    let last = coordinator.config().last_iteration;
    let start = Instant::now();
    let mut summary = RunSummary::default();

    info!(
        "Running iterations {}..={} for {} agents",
        first,
        last,
        agents.len()
    );

    for iteration in first..=last {
        let snapshot = provider.capture(iteration, agents)?;
        coordinator.on_iteration_end(snapshot);

        match coordinator.on_replanning_phase(agents) {
            Ok(outcome) => {
                let keep_going = callback.on_iteration(&outcome.stats);
                summary.iterations.push(outcome.stats);
                if !keep_going {
                    summary.stopped_early = true;
                    break;
                }
            }
            Err(e) if e.is_config() => return Err(e),
            Err(e) => {
                warn!("Iteration {} kept all plans: {}", iteration, e);
                summary.aborted_cycles += 1;
            }
        }
    }

    summary.elapsed_secs = start.elapsed().as_secs_f64();
    info!(
        "Run finished: {} cycles, {} replans, {} aborted, {:.2}s",
        summary.iterations.len(),
        summary.total_replans(),
        summary.aborted_cycles,
        summary.elapsed_secs
    );
    Ok(summary)
}
