use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Opaque agent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(v: u32) -> Self {
        AgentId(v)
    }
}

pub type LocationId = u32;
pub type TimeBin = u32;

/// Agents admitted to switch plans in one iteration. Ordered for stable reporting.
pub type ReplannerSet = BTreeSet<AgentId>;

/// Immutable capture of global simulation state, keyed by (location, time bin).
///
/// Built once per mobility run and shared read-only by every evaluation of that
/// iteration. Exposes no `&mut` accessor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    iteration: usize,
    values: HashMap<(LocationId, TimeBin), f64>,
}

impl Snapshot {
    pub fn new(iteration: usize, values: HashMap<(LocationId, TimeBin), f64>) -> Self {
        Self { iteration, values }
    }

    pub fn from_entries<I>(iteration: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = ((LocationId, TimeBin), f64)>,
    {
        Self {
            iteration,
            values: entries.into_iter().collect(),
        }
    }

    /// Iteration of the mobility run that produced this snapshot.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn get(&self, location: LocationId, bin: TimeBin) -> Option<f64> {
        self.values.get(&(location, bin)).copied()
    }

    pub fn get_or(&self, location: LocationId, bin: TimeBin, fallback: f64) -> f64 {
        self.get(location, bin).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
