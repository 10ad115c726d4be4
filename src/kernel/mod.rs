pub mod bandwidth;
pub mod golden;

pub use self::bandwidth::{BandwidthFit, KernelBandwidthOptimizer};
pub use self::golden::{golden_section_minimize, GoldenSectionResult};

/// Exponential smoothing of the tuned bandwidth across iterations.
///
/// The first observation passes through unchanged.
#[derive(Debug, Clone, Default)]
pub struct BandwidthSmoother {
    inertia: f64,
    current: Option<f64>,
}

impl BandwidthSmoother {
    pub fn new(inertia: f64) -> Self {
        Self {
            inertia: inertia.clamp(0.0, 1.0),
            current: None,
        }
    }

    pub fn update(&mut self, optimal: f64) -> f64 {
        let next = match self.current {
            Some(prev) => self.inertia * prev + (1.0 - self.inertia) * optimal,
            None => optimal,
        };
        self.current = Some(next);
        next
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }
}
