//! ---
//! fmon_section: "11-simulation"
//! fmon_subsection: "model"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Bounded ordered sequences backing logs and rolling windows."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Newest-first log that drops its oldest entries beyond `capacity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingLog<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> RollingLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Build from entries given newest-first, truncating to capacity.
    pub fn from_newest_first(capacity: usize, entries: impl IntoIterator<Item = T>) -> Self {
        let mut log = Self::new(capacity);
        log.entries.extend(entries);
        log.entries.truncate(log.capacity);
        log
    }

    /// Prepend an entry, returning whatever was evicted from the tail.
    pub fn push(&mut self, entry: T) -> Vec<T> {
        self.entries.push_front(entry);
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.entries.pop_back() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn newest(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }
}

/// Oldest-first window that evicts from the front once `capacity` is exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingWindow<T> {
    capacity: usize,
    buckets: VecDeque<T>,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buckets: VecDeque::new(),
        }
    }

    /// Append a bucket, returning the evicted oldest bucket if the window overflowed.
    pub fn push(&mut self, bucket: T) -> Option<T> {
        self.buckets.push_back(bucket);
        if self.buckets.len() > self.capacity {
            self.buckets.pop_front()
        } else {
            None
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.buckets.front()
    }

    pub fn latest(&self) -> Option<&T> {
        self.buckets.back()
    }

    pub(crate) fn latest_mut(&mut self) -> Option<&mut T> {
        self.buckets.back_mut()
    }

    /// Iterate oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_newest_first_and_evicts_oldest() {
        let mut log = RollingLog::new(3);
        for value in 1..=3 {
            assert!(log.push(value).is_empty());
        }
        assert_eq!(log.push(4), vec![1]);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![4, 3, 2]);
        assert_eq!(log.newest(), Some(&4));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn log_from_entries_truncates() {
        let log = RollingLog::from_newest_first(2, vec!["c", "b", "a"]);
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec!["c", "b"]);
    }

    #[test]
    fn window_evicts_exactly_the_oldest_bucket() {
        let mut window = RollingWindow::new(24);
        for hour in 0..24 {
            assert_eq!(window.push(hour), None);
        }
        assert_eq!(window.len(), 24);
        assert_eq!(window.push(24), Some(0));
        assert_eq!(window.len(), 24);
        assert_eq!(window.oldest(), Some(&1));
        assert_eq!(window.latest(), Some(&24));
    }

    #[test]
    fn zero_capacity_is_promoted_to_one() {
        let mut window = RollingWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push('a');
        assert_eq!(window.push('b'), Some('a'));
    }
}
