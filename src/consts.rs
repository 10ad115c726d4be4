/// Floor applied to weight sums and baseline costs before dividing by them.
pub const EPSILON: f64 = 1e-8;

/// Absolute upper bound of the kernel bandwidth search interval.
pub const MAX_BANDWIDTH: f64 = 1e6;

/// The farthest lag's unnormalized weight at the upper bandwidth is e^-BANDWIDTH_DECAY_SPAN.
pub const BANDWIDTH_DECAY_SPAN: f64 = 10.0;

/// Golden-section search stops once the bracket is narrower than this.
pub const GOLDEN_SECTION_TOLERANCE: f64 = 1e-6;

/// Default seed for selector randomness when none is configured.
pub const DEFAULT_SEED: u64 = 4711;
