//! A small congestion game used to exercise the replanning loop end to end.
//!
//! Agents pick one of several parallel routes and a departure bin. Route delay follows the
//! BPR curve of the flow assigned to that (route, bin), and agents dislike departing away
//! from a shared preferred bin.

use crate::api::{Agent, Evaluator, PlanGenerator, SnapshotProvider};
use crate::core_types::{AgentId, LocationId, Snapshot, TimeBin};
use crate::error::{ReplanError, RpResult};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BPR_ALPHA: f64 = 0.15;
const BPR_BETA: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub free_flow_time: f64,
    /// Vehicles per time bin before delay builds up.
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub routes: Vec<Route>,
    pub time_bins: TimeBin,
}

impl Corridor {
    pub fn new(routes: Vec<Route>, time_bins: TimeBin) -> RpResult<Self> {
        if routes.is_empty() {
            return Err(ReplanError::config("corridor needs at least one route"));
        }
        if time_bins == 0 {
            return Err(ReplanError::config("corridor needs at least one time bin"));
        }
        if let Some(idx) = routes
            .iter()
            .position(|r| !(r.free_flow_time > 0.0 && r.capacity > 0.0))
        {
            return Err(ReplanError::config(format!(
                "route {} needs positive free flow time and capacity",
                idx
            )));
        }
        Ok(Self { routes, time_bins })
    }

    /// Routes get slower by 20% each; total capacity roughly matches the population.
    pub fn standard(route_count: usize, time_bins: TimeBin, population: usize) -> RpResult<Self> {
        let slots = (route_count.max(1) * time_bins.max(1) as usize) as f64;
        let capacity = (population as f64 / slots).max(1.0);
        let routes = (0..route_count)
            .map(|i| Route {
                free_flow_time: 10.0 * (1.0 + 0.2 * i as f64),
                capacity,
            })
            .collect();
        Self::new(routes, time_bins)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn travel_time(&self, route: LocationId, flow: f64) -> f64 {
        let r = &self.routes[route as usize];
        r.free_flow_time * (1.0 + BPR_ALPHA * (flow / r.capacity).powi(BPR_BETA))
    }

    fn check_plan(&self, agent: AgentId, plan: &TripPlan) -> RpResult<()> {
        if plan.route as usize >= self.routes.len() || plan.departure_bin >= self.time_bins {
            return Err(ReplanError::Evaluation {
                agent,
                message: format!(
                    "plan (route {}, bin {}) outside corridor of {} routes x {} bins",
                    plan.route,
                    plan.departure_bin,
                    self.routes.len(),
                    self.time_bins
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripPlan {
    pub route: LocationId,
    pub departure_bin: TimeBin,
}

/// Everybody starts on the fastest route at the preferred bin.
pub fn initial_population(size: usize, preferred_bin: TimeBin) -> Vec<Agent<TripPlan>> {
    (0..size as u32)
        .map(|id| {
            Agent::new(
                id,
                TripPlan {
                    route: 0,
                    departure_bin: preferred_bin,
                },
            )
        })
        .collect()
}

/// Loads every plan onto the corridor and records the resulting travel times.
pub struct CorridorSimulation {
    corridor: Corridor,
}

impl CorridorSimulation {
    pub fn new(corridor: Corridor) -> Self {
        Self { corridor }
    }

    pub fn flows(
        &self,
        agents: &[Agent<TripPlan>],
    ) -> RpResult<HashMap<(LocationId, TimeBin), f64>> {
        let mut flows = HashMap::new();
        for agent in agents {
            self.corridor.check_plan(agent.id, &agent.selected)?;
            let key = (agent.selected.route, agent.selected.departure_bin);
            *flows.entry(key).or_insert(0.0) += 1.0;
        }
        Ok(flows)
    }
}

impl SnapshotProvider<TripPlan> for CorridorSimulation {
    fn capture(&mut self, iteration: usize, agents: &[Agent<TripPlan>]) -> RpResult<Snapshot> {
        let flows = self.flows(agents)?;
        let corridor = &self.corridor;
        let entries = (0..corridor.route_count() as LocationId).flat_map(|route| {
            let flows = &flows;
            (0..corridor.time_bins).map(move |bin| {
                let flow = flows.get(&(route, bin)).copied().unwrap_or(0.0);
                ((route, bin), corridor.travel_time(route, flow))
            })
        });
        Ok(Snapshot::from_entries(iteration, entries))
    }
}

/// Negative generalized cost: travel time plus schedule delay.
#[derive(Debug, Clone)]
pub struct CorridorEvaluator {
    corridor: Corridor,
    preferred_bin: TimeBin,
    schedule_delay_weight: f64,
}

impl CorridorEvaluator {
    pub fn new(corridor: Corridor, preferred_bin: TimeBin, schedule_delay_weight: f64) -> Self {
        Self {
            corridor,
            preferred_bin,
            schedule_delay_weight,
        }
    }
}

impl Evaluator<TripPlan> for CorridorEvaluator {
    fn score(&self, agent: AgentId, plan: &TripPlan, snapshot: &Snapshot) -> RpResult<f64> {
        self.corridor.check_plan(agent, plan)?;
        let free_flow = self.corridor.routes[plan.route as usize].free_flow_time;
        let travel_time = snapshot.get_or(plan.route, plan.departure_bin, free_flow);
        let delay = (plan.departure_bin as f64 - self.preferred_bin as f64).abs()
            * self.schedule_delay_weight;
        Ok(-(travel_time + delay))
    }
}

/// Random route choice plus a departure shift of at most one bin.
#[derive(Debug, Clone)]
pub struct CorridorGenerator {
    route_count: u32,
    time_bins: TimeBin,
    candidates: usize,
    seed: u64,
}

impl CorridorGenerator {
    pub fn new(corridor: &Corridor, candidates: usize, seed: u64) -> Self {
        Self {
            route_count: corridor.route_count() as u32,
            time_bins: corridor.time_bins,
            candidates,
            seed,
        }
    }

    // Per-(agent, iteration) streams keep generation independent of thread scheduling.
    fn rng_for(&self, agent: AgentId, iteration: usize) -> Rng {
        let mixed = self.seed
            ^ (agent.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (iteration as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        Rng::with_seed(mixed)
    }
}

impl PlanGenerator for CorridorGenerator {
    type Plan = TripPlan;

    fn generate_candidates(
        &self,
        agent: &Agent<TripPlan>,
        iteration: usize,
    ) -> RpResult<Vec<TripPlan>> {
        let mut rng = self.rng_for(agent.id, iteration);
        let max_bin = self.time_bins.saturating_sub(1) as i64;
        let plans = (0..self.candidates)
            .map(|_| {
                let shift = rng.i64(-1..=1);
                let bin = (agent.selected.departure_bin as i64 + shift).clamp(0, max_bin);
                TripPlan {
                    route: rng.u32(0..self.route_count),
                    departure_bin: bin as TimeBin,
                }
            })
            .collect();
        Ok(plans)
    }
}
