//! Per-account memory of forwarded transaction ids.

use crate::config::SeenCacheStrategy;
use compact_str::CompactString;
use std::collections::{HashSet, VecDeque};

/// Bounded set of transaction ids already accepted for one account.
///
/// Insertion order is tracked so the oldest id can be evicted under
/// [`SeenCacheStrategy::Fifo`].
#[derive(Debug, Clone)]
pub struct SeenCache {
    strategy: SeenCacheStrategy,
    capacity: usize,
    members: HashSet<CompactString>,
    order: VecDeque<CompactString>,
}

impl SeenCache {
    /// Create an empty cache. A zero capacity is raised to one.
    pub fn new(strategy: SeenCacheStrategy, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            strategy,
            capacity,
            members: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an id. Returns `false` if it was already present.
    pub fn insert(&mut self, id: CompactString) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.order.push_back(id);

        if self.members.len() > self.capacity {
            match self.strategy {
                SeenCacheStrategy::Fifo => {
                    if let Some(oldest) = self.order.pop_front() {
                        self.members.remove(&oldest);
                    }
                }
                SeenCacheStrategy::ClearOnOverflow => {
                    let newest = self.order.pop_back();
                    self.members.clear();
                    self.order.clear();
                    if let Some(newest) = newest {
                        self.members.insert(newest.clone());
                        self.order.push_back(newest);
                    }
                }
            }
        }
        true
    }
}
