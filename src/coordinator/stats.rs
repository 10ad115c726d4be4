use crate::error::RpResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// One record per replanning cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    pub iteration: usize,
    pub memorized_snapshots: usize,
    pub step_size: f64,
    pub replanning_rate: f64,
    pub replanner_count: usize,
    /// Threshold the selection admitted against.
    pub gap_threshold: f64,
    /// Running mean of admitted gaps that `gap_threshold` was derived from.
    pub mean_replanner_gap: f64,
    /// Population mean of the gap against the most recent snapshot.
    pub raw_gap: f64,
    /// Population mean of the kernel-weighted gap.
    pub weighted_gap: f64,
    pub min_bandwidth: Option<f64>,
    pub max_bandwidth: Option<f64>,
    pub optimal_bandwidth: Option<f64>,
    /// Bandwidth after smoothing, the one the weights were computed with.
    pub smoothed_bandwidth: Option<f64>,
}

impl IterationStats {
    pub fn realized_rate(&self, population_size: usize) -> f64 {
        if population_size == 0 {
            0.0
        } else {
            self.replanner_count as f64 / population_size as f64
        }
    }

    pub fn log(&self) {
        info!(
            iteration = self.iteration,
            memorized = self.memorized_snapshots,
            step_size = self.step_size,
            rate = self.replanning_rate,
            replanners = self.replanner_count,
            threshold = self.gap_threshold,
            mean_replanner_gap = self.mean_replanner_gap,
            raw_gap = self.raw_gap,
            weighted_gap = self.weighted_gap,
            min_mu = ?self.min_bandwidth,
            max_mu = ?self.max_bandwidth,
            opt_mu = ?self.optimal_bandwidth,
            mu = ?self.smoothed_bandwidth,
            "replanning cycle committed"
        );
    }
}

/// Appends [`IterationStats`] rows to a CSV file, header first.
pub struct StatsWriter {
    writer: csv::Writer<File>,
}

impl StatsWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> RpResult<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }

    pub fn write(&mut self, stats: &IterationStats) -> RpResult<()> {
        self.writer.serialize(stats)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn read_stats<P: AsRef<Path>>(path: P) -> RpResult<Vec<IterationStats>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
