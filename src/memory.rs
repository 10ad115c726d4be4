use crate::core_types::Snapshot;
use crate::error::{ReplanError, RpResult};
use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded FIFO of recent snapshots. Lag 0 is the most recent entry.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    capacity: usize,
    entries: VecDeque<Arc<Snapshot>>,
}

impl SnapshotHistory {
    pub fn new(max_memory: usize) -> RpResult<Self> {
        if max_memory == 0 {
            return Err(ReplanError::config("SnapshotHistory needs max_memory >= 1"));
        }
        Ok(Self {
            capacity: max_memory,
            entries: VecDeque::with_capacity(max_memory + 1),
        })
    }

    /// Pushes to the front and evicts from the back once over capacity.
    pub fn append(&mut self, snapshot: Snapshot) {
        self.entries.push_front(Arc::new(snapshot));
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Swaps the lag-0 entry, or appends when the history is empty.
    pub fn replace_latest(&mut self, snapshot: Snapshot) {
        match self.entries.front_mut() {
            Some(front) => *front = Arc::new(snapshot),
            None => self.append(snapshot),
        }
    }

    /// All stored snapshots, most recent first.
    pub fn get_all(&self) -> Vec<Arc<Snapshot>> {
        self.entries.iter().cloned().collect()
    }

    pub fn get(&self, lag: usize) -> Option<&Arc<Snapshot>> {
        self.entries.get(lag)
    }

    pub fn latest(&self) -> Option<&Arc<Snapshot>> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
