//! Bounded snapshot history for undo

use std::collections::VecDeque;

use super::types::Annotation;

/// Default number of snapshots kept
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// LIFO stack of annotation snapshots.
///
/// Pushing past the limit evicts the oldest snapshot. Each entry is an owned
/// copy of the collection, so later edits never reach a stored snapshot.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<Vec<Annotation>>,
    limit: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryStack {
    /// Create a stack holding at most `limit` snapshots (minimum 1)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, snapshot: &[Annotation]) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot.to_vec());
    }

    pub fn pop(&mut self) -> Option<Vec<Annotation>> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
