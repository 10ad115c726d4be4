use crate::consts::DEFAULT_SEED;
use crate::error::{ReplanError, RpResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

/// Which step size schedule drives the target replanning rate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum StepControl {
    #[strum(serialize = "EXP")]
    #[serde(rename = "EXP")]
    Exp,
    #[strum(serialize = "MSA")]
    #[serde(rename = "MSA")]
    Msa,
}

/// Admission policy used to turn weighted gaps into a replanner set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ReplannerIdentifier {
    #[strum(serialize = "MSA")]
    #[serde(rename = "MSA")]
    Msa,
    #[strum(serialize = "SBAYTI2007")]
    #[serde(rename = "SBAYTI2007")]
    Sbayti2007,
    #[strum(serialize = "GAPPROP")]
    #[serde(rename = "GAPPROP")]
    GapProp,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplanConfig {
    // === MEMORY ===
    #[arg(long, default_value_t = 5)]
    pub max_memory: usize,
    #[arg(long, default_value_t = 0.0)]
    pub smoothing_inertia: f64,

    // === STEP SIZE ===
    #[arg(long, default_value = "EXP")]
    pub step_control: StepControl,
    #[arg(long, default_value_t = 0.1)]
    pub initial_step_size_factor: f64,
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub replanning_rate_iteration_exponent: f64,

    // === SELECTION ===
    #[arg(long, default_value = "SBAYTI2007")]
    pub replanner_identifier: ReplannerIdentifier,
    #[arg(long, default_value_t = false)]
    pub is_using_threshold: bool,
    #[arg(long, default_value_t = false)]
    pub is_gap_weighting: bool,

    // === RUN BOUNDS ===
    #[arg(long, default_value_t = 0)]
    pub first_iteration: usize,
    #[arg(long, default_value_t = 100)]
    pub last_iteration: usize,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

impl Default for ReplanConfig {
    fn default() -> Self {
        Self {
            max_memory: 5,
            smoothing_inertia: 0.0,
            step_control: StepControl::Exp,
            initial_step_size_factor: 0.1,
            replanning_rate_iteration_exponent: -1.0,
            replanner_identifier: ReplannerIdentifier::Sbayti2007,
            is_using_threshold: false,
            is_gap_weighting: false,
            first_iteration: 0,
            last_iteration: 100,
            seed: DEFAULT_SEED,
        }
    }
}

impl ReplanConfig {
    /// Oldest replan lag that can still separate two memorized snapshots.
    #[inline(always)]
    pub fn max_lag(&self) -> usize {
        self.max_memory.saturating_sub(1)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> RpResult<Self> {
        let content = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&content)?;
        Ok(cfg)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RpResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> RpResult<()> {
        if self.max_memory == 0 {
            return Err(ReplanError::config("max_memory must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.smoothing_inertia) {
            return Err(ReplanError::config(format!(
                "smoothing_inertia must lie in [0, 1], got {}",
                self.smoothing_inertia
            )));
        }
        if !(self.initial_step_size_factor.is_finite() && self.initial_step_size_factor > 0.0) {
            return Err(ReplanError::config(format!(
                "initial_step_size_factor must be positive, got {}",
                self.initial_step_size_factor
            )));
        }
        if !self.replanning_rate_iteration_exponent.is_finite() {
            return Err(ReplanError::config(
                "replanning_rate_iteration_exponent must be finite",
            ));
        }
        if self.last_iteration < self.first_iteration {
            return Err(ReplanError::config(format!(
                "last_iteration ({}) precedes first_iteration ({})",
                self.last_iteration, self.first_iteration
            )));
        }
        if self.step_control == StepControl::Exp && self.last_iteration == self.first_iteration {
            return Err(ReplanError::config(
                "EXP step control needs last_iteration > first_iteration",
            ));
        }
        if self.is_gap_weighting {
            return Err(ReplanError::config(
                "is_gap_weighting = true is not supported",
            ));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &ReplanConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(max_memory, "max_memory");
        update_if_present!(smoothing_inertia, "smoothing_inertia");

        update_if_present!(step_control, "step_control");
        update_if_present!(initial_step_size_factor, "initial_step_size_factor");
        update_if_present!(
            replanning_rate_iteration_exponent,
            "replanning_rate_iteration_exponent"
        );

        update_if_present!(replanner_identifier, "replanner_identifier");
        update_if_present!(is_using_threshold, "is_using_threshold");
        update_if_present!(is_gap_weighting, "is_gap_weighting");

        update_if_present!(first_iteration, "first_iteration");
        update_if_present!(last_iteration, "last_iteration");
        update_if_present!(seed, "seed");
    }
}
