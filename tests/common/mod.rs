#![allow(dead_code)]

use replanforge::api::{Agent, Evaluator, PlanGenerator};
use replanforge::config::ReplanConfig;
use replanforge::core_types::{AgentId, Snapshot};
use replanforge::error::{ReplanError, RpResult};
use replanforge::selector::RankedAgent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Plans are plain quality numbers; the snapshot entry at (0, 0) scales them.
pub type Plan = f64;

pub fn population(n: u32) -> Vec<Agent<Plan>> {
    (0..n).map(|id| Agent::new(id, 0.0)).collect()
}

pub fn uniform_snapshot(iteration: usize, scale: f64) -> Snapshot {
    Snapshot::from_entries(iteration, [((0, 0), scale)])
}

pub fn small_config() -> ReplanConfig {
    ReplanConfig {
        max_memory: 2,
        last_iteration: 10,
        ..Default::default()
    }
}

/// `weighted_old_score` is -1 so GAPPROP sees a unit baseline cost.
pub fn ranked(gaps: &[f64]) -> Vec<RankedAgent> {
    gaps.iter()
        .enumerate()
        .map(|(i, &g)| RankedAgent {
            id: AgentId(i as u32),
            weighted_gap: g,
            weighted_old_score: -1.0,
        })
        .collect()
}

pub fn ids(agents: &[&RankedAgent]) -> Vec<u32> {
    let mut out: Vec<u32> = agents.iter().map(|a| a.id.0).collect();
    out.sort_unstable();
    out
}

pub struct LinearEvaluator;

impl Evaluator<Plan> for LinearEvaluator {
    fn score(&self, _agent: AgentId, plan: &Plan, snapshot: &Snapshot) -> RpResult<f64> {
        Ok(plan * snapshot.get_or(0, 0, 1.0))
    }
}

/// Fails for one agent while armed.
pub struct SwitchableEvaluator {
    pub target: AgentId,
    pub armed: Arc<AtomicBool>,
}

impl SwitchableEvaluator {
    pub fn new(target: u32) -> (Self, Arc<AtomicBool>) {
        let armed = Arc::new(AtomicBool::new(true));
        (
            Self {
                target: AgentId(target),
                armed: armed.clone(),
            },
            armed,
        )
    }
}

impl Evaluator<Plan> for SwitchableEvaluator {
    fn score(&self, agent: AgentId, plan: &Plan, snapshot: &Snapshot) -> RpResult<f64> {
        if agent == self.target && self.armed.load(Ordering::SeqCst) {
            return Err(ReplanError::Evaluation {
                agent,
                message: "router unavailable".to_string(),
            });
        }
        LinearEvaluator.score(agent, plan, snapshot)
    }
}

pub struct NanEvaluator;

impl Evaluator<Plan> for NanEvaluator {
    fn score(&self, _agent: AgentId, _plan: &Plan, _snapshot: &Snapshot) -> RpResult<f64> {
        Ok(f64::NAN)
    }
}

/// One candidate: the current plan shifted by a fixed amount.
pub struct ShiftGenerator {
    pub shift: f64,
}

impl PlanGenerator for ShiftGenerator {
    type Plan = Plan;

    fn generate_candidates(&self, agent: &Agent<Plan>, _iteration: usize) -> RpResult<Vec<Plan>> {
        Ok(vec![agent.selected + self.shift])
    }
}

/// Several candidates per agent; the best one is `selected + best`.
pub struct SpreadGenerator {
    pub offsets: Vec<f64>,
}

impl PlanGenerator for SpreadGenerator {
    type Plan = Plan;

    fn generate_candidates(&self, agent: &Agent<Plan>, _iteration: usize) -> RpResult<Vec<Plan>> {
        Ok(self.offsets.iter().map(|o| agent.selected + o).collect())
    }
}

pub struct EmptyGenerator;

impl PlanGenerator for EmptyGenerator {
    type Plan = Plan;

    fn generate_candidates(&self, _agent: &Agent<Plan>, _iteration: usize) -> RpResult<Vec<Plan>> {
        Ok(Vec::new())
    }
}

/// Fails every candidate search while armed, otherwise behaves like a unit shift.
pub struct FailingGenerator {
    pub armed: Arc<AtomicBool>,
}

impl FailingGenerator {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let armed = Arc::new(AtomicBool::new(true));
        (
            Self {
                armed: armed.clone(),
            },
            armed,
        )
    }
}

impl PlanGenerator for FailingGenerator {
    type Plan = Plan;

    fn generate_candidates(&self, agent: &Agent<Plan>, _iteration: usize) -> RpResult<Vec<Plan>> {
        if self.armed.load(Ordering::SeqCst) {
            return Err(ReplanError::Evaluation {
                agent: agent.id,
                message: "no candidate routes".to_string(),
            });
        }
        Ok(vec![agent.selected + 1.0])
    }
}

pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "expected {} ~ {} (tol {})", a, b, tol);
}
