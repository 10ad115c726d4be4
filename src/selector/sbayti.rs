use super::{admission_count, RankedAgent};

/// Top `floor(rate * N)` agents by weighted gap.
pub fn select_by_rank(ranked: &[RankedAgent], rate: f64) -> Vec<&RankedAgent> {
    ranked
        .iter()
        .take(admission_count(rate, ranked.len()))
        .collect()
}

/// Every agent whose weighted gap reaches `threshold`. Non-improving candidates are never
/// admitted, even against a zero threshold.
pub fn select_by_threshold(ranked: &[RankedAgent], threshold: f64) -> Vec<&RankedAgent> {
    ranked
        .iter()
        .filter(|a| a.weighted_gap > 0.0 && a.weighted_gap >= threshold)
        .collect()
}
