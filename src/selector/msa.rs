use super::{admission_count, RankedAgent};
use fastrand::Rng;

/// Robbins-Monro baseline: a uniformly random subset of `floor(rate * N)` agents,
/// ignoring the gaps entirely.
pub fn select<'a>(ranked: &'a [RankedAgent], rate: f64, rng: &mut Rng) -> Vec<&'a RankedAgent> {
    let mut pool: Vec<&RankedAgent> = ranked.iter().collect();
    rng.shuffle(&mut pool);
    pool.truncate(admission_count(rate, ranked.len()));
    pool
}
