//! Recent-symbol window and caller-visible snapshots of it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

const PREALLOCATE_LIMIT: usize = 256;

/// The most recent symbol indices, oldest first, capped at the model's
/// maximum context length.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequenceContext {
    window: VecDeque<usize>,
    capacity: usize,
}

impl SequenceContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Append a symbol, dropping the oldest one at capacity.
    pub fn push(&mut self, index: usize) {
        if self.capacity == 0 {
            return;
        }
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(index);
    }

    /// The `n`-th most recent symbol, 1-based.
    pub fn recent(&self, n: usize) -> Option<usize> {
        if n == 0 || n > self.window.len() {
            return None;
        }
        self.window.get(self.window.len() - n).copied()
    }

    /// Replace the contents, keeping only the last `capacity` entries.
    pub fn replace(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.window.clear();
        for index in indices {
            self.push(index);
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Indices oldest first.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.window.iter().copied()
    }
}

/// Immutable copy of a predictor's context, most recent symbol last.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSnapshot<S> {
    symbols: Vec<S>,
}

impl<S> ContextSnapshot<S> {
    pub fn new(symbols: Vec<S>) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &[S] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn into_inner(self) -> Vec<S> {
        self.symbols
    }
}

impl<S> From<Vec<S>> for ContextSnapshot<S> {
    fn from(symbols: Vec<S>) -> Self {
        Self::new(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_drops_oldest_at_capacity() {
        let mut ctx = SequenceContext::new(2);
        ctx.push(1);
        ctx.push(2);
        ctx.push(3);
        assert_eq!(ctx.iter().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(ctx.recent(1), Some(3));
        assert_eq!(ctx.recent(2), Some(2));
        assert_eq!(ctx.recent(3), None);
        assert_eq!(ctx.recent(0), None);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut ctx = SequenceContext::new(0);
        ctx.push(5);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_replace_keeps_most_recent() {
        let mut ctx = SequenceContext::new(3);
        ctx.replace(vec![0, 1, 2, 3, 4]);
        assert_eq!(ctx.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        ctx.clear();
        assert_eq!(ctx.len(), 0);
        assert_eq!(ctx.capacity(), 3);
    }

    #[test]
    fn test_snapshot_accessors() {
        let snap = ContextSnapshot::from(vec!['a', 'b']);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.symbols(), &['a', 'b']);
        assert_eq!(snap.clone().into_inner(), vec!['a', 'b']);
        assert!(ContextSnapshot::<char>::default().is_empty());
    }
}
