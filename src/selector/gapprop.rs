use super::RankedAgent;
use crate::consts::EPSILON;
use fastrand::Rng;
use tracing::warn;

/// Admission probability `rate * gap / max(eps, -weighted_old_score)`, clamped to [0, 1].
pub fn admission_probability(agent: &RankedAgent, rate: f64) -> (f64, bool) {
    let old_cost = -agent.weighted_old_score;
    let floored = old_cost.is_nan() || old_cost < EPSILON;
    let denom = if floored { EPSILON } else { old_cost };
    let p = rate * agent.weighted_gap / denom;
    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    (p, floored)
}

/// Independent Bernoulli draw per agent. Draws happen in ranked order so a fixed seed
/// reproduces the same set.
pub fn select<'a>(ranked: &'a [RankedAgent], rate: f64, rng: &mut Rng) -> Vec<&'a RankedAgent> {
    let mut floors = 0usize;
    let admitted: Vec<&RankedAgent> = ranked
        .iter()
        .filter(|agent| {
            let (p, floored) = admission_probability(agent, rate);
            if floored {
                floors += 1;
            }
            rng.f64() < p
        })
        .collect();

    if floors > 0 {
        warn!(
            "GAPPROP: {} agent(s) had a baseline cost below {:e}; denominator floored",
            floors, EPSILON
        );
    }
    admitted
}
