//! Linear undo/redo over whole-scene snapshots.

use std::collections::VecDeque;

use serde::Serialize;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// An immutable serialized scene plus the label of the action that produced it.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub label: String,
    pub scene: String,
}

impl Snapshot {
    pub fn new(label: &str, scene: String) -> Self {
        Snapshot { label: label.to_string(), scene }
    }
}

/// Bounded snapshot history with a current-index pointer. Pushing from a non-tip index
/// discards the redo branch first.
#[derive(Clone, Debug)]
pub struct SnapshotHistory {
    entries: VecDeque<Snapshot>,
    index: Option<usize>,
    capacity: usize,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        SnapshotHistory::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SnapshotHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        SnapshotHistory { entries: VecDeque::with_capacity(capacity + 1), index: None, capacity }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push_back(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.index = Some(self.entries.len() - 1);
        tracing::debug!(len = self.entries.len(), index = self.entries.len() - 1, "history push");
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        match self.index {
            Some(i) if i > 0 => {
                self.index = Some(i - 1);
                self.entries.get(i - 1)
            }
            _ => None,
        }
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.index?.checked_add(1)?;
        if next >= self.entries.len() {
            return None;
        }
        self.index = Some(next);
        self.entries.get(next)
    }

    /// Moves the pointer directly to `index`; out of range is a no-op.
    pub fn jump_to(&mut self, index: usize) -> Option<&Snapshot> {
        if index >= self.entries.len() {
            return None;
        }
        self.index = Some(index);
        self.entries.get(index)
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.map_or(false, |i| i + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.index?)
    }

    /// `None` while the history is empty (the `-1` state).
    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|s| s.label.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}
