use crate::config::{ReplanConfig, StepControl};
use crate::error::{ReplanError, RpResult};

/// Run-level bounds the schedule is initialized from on first use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleBounds {
    pub first_iteration: usize,
    pub last_iteration: usize,
    pub initial_step_size_factor: f64,
    pub population_size: usize,
}

/// Target replanning volume as a function of the iteration index.
///
/// `step_size(it) / N` is the fraction of the population that should switch plans.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSizeSchedule {
    /// Geometric progression from `f * N` at the first iteration to `N` at the last.
    Exp {
        first_iteration: usize,
        initial: f64,
        ratio: f64,
    },
    /// `f * N * (it + 1)^exponent`.
    Msa {
        scale: f64,
        exponent: f64,
    },
}

impl StepSizeSchedule {
    pub fn new(control: StepControl, bounds: ScheduleBounds, exponent: f64) -> RpResult<Self> {
        let f = bounds.initial_step_size_factor;
        if !(f.is_finite() && f > 0.0) {
            return Err(ReplanError::config(format!(
                "initial_step_size_factor must be positive, got {}",
                f
            )));
        }
        if bounds.population_size == 0 {
            return Err(ReplanError::config("step size needs a non-empty population"));
        }
        let n = bounds.population_size as f64;

        match control {
            StepControl::Exp => {
                if bounds.last_iteration <= bounds.first_iteration {
                    return Err(ReplanError::config(format!(
                        "EXP step control needs last_iteration ({}) > first_iteration ({})",
                        bounds.last_iteration, bounds.first_iteration
                    )));
                }
                let initial = f * n;
                let span = (bounds.last_iteration - bounds.first_iteration) as f64;
                let ratio = (n / initial).powf(1.0 / span);
                Ok(StepSizeSchedule::Exp {
                    first_iteration: bounds.first_iteration,
                    initial,
                    ratio,
                })
            }
            StepControl::Msa => {
                if !exponent.is_finite() {
                    return Err(ReplanError::config("MSA exponent must be finite"));
                }
                Ok(StepSizeSchedule::Msa {
                    scale: f * n,
                    exponent,
                })
            }
        }
    }

    pub fn from_config(cfg: &ReplanConfig, population_size: usize) -> RpResult<Self> {
        Self::new(
            cfg.step_control,
            ScheduleBounds {
                first_iteration: cfg.first_iteration,
                last_iteration: cfg.last_iteration,
                initial_step_size_factor: cfg.initial_step_size_factor,
                population_size,
            },
            cfg.replanning_rate_iteration_exponent,
        )
    }

    pub fn step_size(&self, iteration: usize) -> f64 {
        match *self {
            StepSizeSchedule::Exp {
                first_iteration,
                initial,
                ratio,
            } => {
                let k = iteration as f64 - first_iteration as f64;
                initial * ratio.powf(k)
            }
            StepSizeSchedule::Msa { scale, exponent } => {
                scale * ((iteration + 1) as f64).powf(exponent)
            }
        }
    }

    /// Target replanning fraction, clamped to [0, 1].
    pub fn replanning_rate(&self, iteration: usize, population_size: usize) -> f64 {
        if population_size == 0 {
            return 0.0;
        }
        (self.step_size(iteration) / population_size as f64).clamp(0.0, 1.0)
    }
}
