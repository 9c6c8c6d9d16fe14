//! Undo history for the timeline.

use std::collections::VecDeque;

use super::Timeline;

/// Stack of prior timeline snapshots, newest last.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    snapshots: VecDeque<Timeline>,
    limit: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::with_limit(crate::constants::DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryStack {
    /// Create a stack that keeps at most `limit` snapshots (0 means unbounded).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            limit,
        }
    }

    /// Record the state a mutation is about to replace.
    pub fn push(&mut self, snapshot: Timeline) {
        self.snapshots.push_back(snapshot);
        if self.limit > 0 {
            while self.snapshots.len() > self.limit {
                self.snapshots.pop_front();
            }
        }
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Option<Timeline> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}
