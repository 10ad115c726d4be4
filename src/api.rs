use crate::core_types::{AgentId, Snapshot};
use crate::error::RpResult;

/// A simulated entity and the one plan it currently follows.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent<P> {
    pub id: AgentId,
    pub selected: P,
}

impl<P> Agent<P> {
    pub fn new(id: impl Into<AgentId>, selected: P) -> Self {
        Self {
            id: id.into(),
            selected,
        }
    }
}

/// Produces alternative plans for an agent. Called once per agent per replanning phase,
/// possibly from several threads at once.
pub trait PlanGenerator: Send + Sync {
    type Plan: Clone + Send + Sync;

    fn generate_candidates(
        &self,
        agent: &Agent<Self::Plan>,
        iteration: usize,
    ) -> RpResult<Vec<Self::Plan>>;
}

/// Scores a plan against a memorized snapshot without re-running the simulation.
/// Higher is better; the result must be finite.
pub trait Evaluator<P>: Send + Sync {
    fn score(&self, agent: AgentId, plan: &P, snapshot: &Snapshot) -> RpResult<f64>;
}

/// The mobility simulation seen from the replanning loop: one immutable snapshot per
/// executed iteration.
pub trait SnapshotProvider<P> {
    fn capture(&mut self, iteration: usize, agents: &[Agent<P>]) -> RpResult<Snapshot>;
}
