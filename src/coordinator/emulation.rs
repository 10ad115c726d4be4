use crate::api::{Agent, Evaluator, PlanGenerator};
use crate::core_types::{AgentId, Snapshot};
use crate::error::{ReplanError, RpResult};
use rayon::prelude::*;
use std::sync::Arc;

fn checked_score<P, E>(evaluator: &E, id: AgentId, plan: &P, snapshot: &Snapshot) -> RpResult<f64>
where
    E: Evaluator<P> + ?Sized,
{
    let score = evaluator.score(id, plan, snapshot)?;
    if !score.is_finite() {
        return Err(ReplanError::Evaluation {
            agent: id,
            message: format!(
                "non-finite score {} against snapshot of iteration {}",
                score,
                snapshot.iteration()
            ),
        });
    }
    Ok(score)
}

/// `scores[n][lag]` of `plans[n]` against every memorized snapshot. Fails on the first
/// evaluator error.
pub fn score_plans<P, E>(
    evaluator: &E,
    ids: &[AgentId],
    plans: &[P],
    snapshots: &[Arc<Snapshot>],
) -> RpResult<Vec<Vec<f64>>>
where
    P: Sync,
    E: Evaluator<P> + ?Sized,
{
    ids.par_iter()
        .zip(plans.par_iter())
        .map(|(&id, plan)| {
            snapshots
                .iter()
                .map(|s| checked_score(evaluator, id, plan, s))
                .collect::<RpResult<Vec<f64>>>()
        })
        .collect()
}

/// Each agent's best generated candidate against `latest`. Agents without candidates keep
/// their current plan as the candidate, which yields a zero gap.
pub fn best_candidates<G, E>(
    generator: &G,
    evaluator: &E,
    agents: &[Agent<G::Plan>],
    iteration: usize,
    latest: &Snapshot,
) -> RpResult<Vec<G::Plan>>
where
    G: PlanGenerator + ?Sized,
    E: Evaluator<G::Plan> + ?Sized,
{
    agents
        .par_iter()
        .map(|agent| {
            let candidates = generator.generate_candidates(agent, iteration)?;
            let mut best: Option<(f64, G::Plan)> = None;
            for plan in candidates {
                let score = checked_score(evaluator, agent.id, &plan, latest)?;
                let better = match &best {
                    Some((best_score, _)) => score > *best_score,
                    None => true,
                };
                if better {
                    best = Some((score, plan));
                }
            }
            Ok(best
                .map(|(_, plan)| plan)
                .unwrap_or_else(|| agent.selected.clone()))
        })
        .collect()
}

/// `new - old`, row by row.
pub fn gap_matrix(old_scores: &[Vec<f64>], new_scores: &[Vec<f64>]) -> Vec<Vec<f64>> {
    old_scores
        .par_iter()
        .zip(new_scores.par_iter())
        .map(|(old, new)| new.iter().zip(old.iter()).map(|(n, o)| n - o).collect())
        .collect()
}

#[inline]
pub fn weighted_sum(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values.iter()).map(|(w, v)| w * v).sum()
}
