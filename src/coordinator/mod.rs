pub mod emulation;
pub mod stats;

pub use self::stats::{IterationStats, StatsWriter};

use crate::api::{Agent, Evaluator, PlanGenerator};
use crate::config::ReplanConfig;
use crate::core_types::{ReplannerSet, Snapshot};
use crate::error::{ReplanError, RpResult};
use crate::kernel::{BandwidthSmoother, KernelBandwidthOptimizer};
use crate::lag_distance::LagDistanceTracker;
use crate::memory::SnapshotHistory;
use crate::selector::{RankedAgent, ReplannerSelector};
use crate::stepsize::StepSizeSchedule;
use rayon::prelude::*;
use std::collections::HashSet;
use strum_macros::Display;
use tracing::{debug, info, warn};

/// Where the coordinator is inside one replanning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CyclePhase {
    Idle,
    SnapshotAppended,
    ScoringOld,
    PlanGenerated,
    ScoringNew,
    GapComputed,
    WeightsTuned,
    Selected,
    Committed,
}

/// What one committed cycle decided.
#[derive(Debug, Clone)]
pub struct ReplanOutcome {
    pub replanners: ReplannerSet,
    pub stats: IterationStats,
}

/// Drives one selective-replanning cycle per simulation iteration.
///
/// The host calls [`Self::on_iteration_end`] after every mobility run and
/// [`Self::on_replanning_phase`] when agents may switch plans. A cycle either commits the
/// whole selection or, on any failure, leaves every agent on the plan it had.
pub struct ReplanCoordinator<G, E>
where
    G: PlanGenerator,
    E: Evaluator<G::Plan>,
{
    config: ReplanConfig,
    generator: G,
    evaluator: E,

    history: SnapshotHistory,
    tracker: LagDistanceTracker,
    schedule: Option<StepSizeSchedule>,
    selector: ReplannerSelector,
    smoother: BandwidthSmoother,

    iteration: usize,
    phase: CyclePhase,
    stats_writer: Option<StatsWriter>,
    last_stats: Option<IterationStats>,
}

impl<G, E> ReplanCoordinator<G, E>
where
    G: PlanGenerator,
    E: Evaluator<G::Plan>,
{
    pub fn new(config: ReplanConfig, generator: G, evaluator: E) -> RpResult<Self> {
        config.validate()?;
        let history = SnapshotHistory::new(config.max_memory)?;
        let selector = ReplannerSelector::new(&config)?;
        let smoother = BandwidthSmoother::new(config.smoothing_inertia);

        info!(
            "Replanning: memory={}, step={}, policy={}, threshold={}, iterations={}..={}",
            config.max_memory,
            config.step_control,
            config.replanner_identifier,
            config.is_using_threshold,
            config.first_iteration,
            config.last_iteration
        );

        Ok(Self {
            iteration: config.first_iteration,
            config,
            generator,
            evaluator,
            history,
            tracker: LagDistanceTracker::new(),
            schedule: None,
            selector,
            smoother,
            phase: CyclePhase::Idle,
            stats_writer: None,
            last_stats: None,
        })
    }

    pub fn with_stats_writer(mut self, writer: StatsWriter) -> Self {
        self.stats_writer = Some(writer);
        self
    }

    pub fn config(&self) -> &ReplanConfig {
        &self.config
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn tracker(&self) -> &LagDistanceTracker {
        &self.tracker
    }

    pub fn selector(&self) -> &ReplannerSelector {
        &self.selector
    }

    /// Index of the iteration the next replanning phase belongs to.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn last_stats(&self) -> Option<&IterationStats> {
        self.last_stats.as_ref()
    }

    fn enter(&mut self, phase: CyclePhase) {
        debug!("Cycle {}: {} -> {}", self.iteration, self.phase, phase);
        self.phase = phase;
    }

    /// Memorizes the state produced by the mobility run that just finished.
    ///
    /// A second snapshot before the replanning phase replaces the pending one, so the
    /// history never grows by more than one entry per cycle.
    pub fn on_iteration_end(&mut self, snapshot: Snapshot) {
        if self.phase == CyclePhase::SnapshotAppended {
            warn!(
                "Cycle {}: snapshot {} replaces the one not yet replanned against",
                self.iteration,
                snapshot.iteration()
            );
            self.history.replace_latest(snapshot);
        } else {
            self.history.append(snapshot);
        }
        self.enter(CyclePhase::SnapshotAppended);
    }

    /// Runs one full cycle and commits the admitted plan switches into `agents`.
    ///
    /// On error no agent's plan changes. The iteration still counts: the lag tracker
    /// records that nobody replanned so it stays aligned with the snapshot history.
    /// A call without a fresh snapshot is rejected and leaves the coordinator untouched.
    pub fn on_replanning_phase(
        &mut self,
        agents: &mut [Agent<G::Plan>],
    ) -> RpResult<ReplanOutcome> {
        if self.phase != CyclePhase::SnapshotAppended {
            return Err(ReplanError::Validation(format!(
                "replanning phase of cycle {} called in phase {}, expected a fresh snapshot",
                self.iteration, self.phase
            )));
        }
        match self.run_cycle(agents) {
            Ok(outcome) => {
                self.finish_iteration();
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    "Replanning cycle {} aborted in phase {}: {}. All agents keep their plans.",
                    self.iteration, self.phase, e
                );
                self.tracker
                    .register_replanners(std::iter::empty(), self.config.max_lag());
                self.finish_iteration();
                Err(e)
            }
        }
    }

    fn finish_iteration(&mut self) {
        self.iteration += 1;
        self.enter(CyclePhase::Idle);
    }

    fn run_cycle(&mut self, agents: &mut [Agent<G::Plan>]) -> RpResult<ReplanOutcome> {
        if agents.is_empty() {
            return Err(ReplanError::Validation(
                "replanning phase called with an empty population".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(agents.len());
        if let Some(dup) = agents.iter().find(|a| !seen.insert(a.id)) {
            return Err(ReplanError::Validation(format!(
                "agent {} appears more than once in the population",
                dup.id
            )));
        }

        let n = agents.len();
        let snapshots = self.history.get_all();
        let ids: Vec<_> = agents.iter().map(|a| a.id).collect();

        // 1. Emulate the current plans against every memorized state
        self.enter(CyclePhase::ScoringOld);
        let old_plans: Vec<G::Plan> = agents.iter().map(|a| a.selected.clone()).collect();
        let old_scores = emulation::score_plans(&self.evaluator, &ids, &old_plans, &snapshots)?;

        // 2. Best fresh candidate per agent, judged on the latest state
        self.enter(CyclePhase::PlanGenerated);
        let new_plans = emulation::best_candidates(
            &self.generator,
            &self.evaluator,
            agents,
            self.iteration,
            &snapshots[0],
        )?;

        self.enter(CyclePhase::ScoringNew);
        let new_scores = emulation::score_plans(&self.evaluator, &ids, &new_plans, &snapshots)?;

        self.enter(CyclePhase::GapComputed);
        let gaps = emulation::gap_matrix(&old_scores, &new_scores);

        // 3. Pool the lags
        self.enter(CyclePhase::WeightsTuned);
        let optimizer = KernelBandwidthOptimizer::new(&gaps, self.tracker.distances())?;
        let fit = optimizer.optimize()?;
        let (weights, smoothed_mu) = match fit.optimal_mu {
            Some(mu) => {
                let smoothed = self.smoother.update(mu);
                (optimizer.compute_weights(0, smoothed, true)?, Some(smoothed))
            }
            None => (fit.weights.clone(), None),
        };

        let entries: Vec<RankedAgent> = ids
            .par_iter()
            .zip(gaps.par_iter())
            .zip(old_scores.par_iter())
            .map(|((&id, gap), old)| RankedAgent {
                id,
                weighted_gap: emulation::weighted_sum(&weights, gap),
                weighted_old_score: emulation::weighted_sum(&weights, old),
            })
            .collect();

        // 4. Admission
        self.enter(CyclePhase::Selected);
        let raw_gap = gaps.iter().map(|row| row[0]).sum::<f64>() / n as f64;
        let weighted_gap = entries.iter().map(|e| e.weighted_gap).sum::<f64>() / n as f64;
        let ranked = self.selector.rank(entries);

        let schedule = match self.schedule.take() {
            Some(s) => s,
            None => StepSizeSchedule::from_config(&self.config, n)?,
        };
        let step_size = schedule.step_size(self.iteration);
        self.schedule = Some(schedule);
        let rate = (step_size / n as f64).clamp(0.0, 1.0);

        let selection = self.selector.select(&ranked, rate);

        // 5. Commit. Nothing above touched `agents`.
        self.enter(CyclePhase::Committed);
        for (agent, plan) in agents.iter_mut().zip(new_plans) {
            if selection.replanners.contains(&agent.id) {
                agent.selected = plan;
            }
        }

        // Reported alongside the threshold it produced, before this cycle is folded in
        let mean_replanner_gap = self.selector.running_mean_gap();
        self.selector
            .update_statistics(self.iteration, rate, selection.mean_admitted_gap);
        self.tracker
            .register_replanners(selection.replanners.iter(), self.config.max_lag());

        let stats = IterationStats {
            iteration: self.iteration,
            memorized_snapshots: snapshots.len(),
            step_size,
            replanning_rate: rate,
            replanner_count: selection.replanners.len(),
            gap_threshold: selection.gap_threshold,
            mean_replanner_gap,
            raw_gap,
            weighted_gap,
            min_bandwidth: fit.min_mu,
            max_bandwidth: fit.max_mu,
            optimal_bandwidth: fit.optimal_mu,
            smoothed_bandwidth: smoothed_mu,
        };
        self.emit(&stats);

        Ok(ReplanOutcome {
            replanners: selection.replanners,
            stats,
        })
    }

    fn emit(&mut self, stats: &IterationStats) {
        stats.log();
        if let Some(writer) = self.stats_writer.as_mut() {
            // The selection is already committed; a lost log row must not undo it.
            if let Err(e) = writer.write(stats) {
                warn!("Failed to write statistics for iteration {}: {}", stats.iteration, e);
            }
        }
        self.last_stats = Some(stats.clone());
    }
}
