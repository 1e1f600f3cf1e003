//! A concurrent `u64` set split across independently locked shards.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashSet;

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 16;

/// A set of 64-bit fingerprints safe to insert into from many threads.
///
/// Each key maps to one shard; contention only happens between threads that
/// hit the same shard at the same time.
#[derive(Debug)]
pub struct ShardedHashSet {
    shards: Box<[Mutex<FxHashSet<u64>>]>,
}

impl Default for ShardedHashSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardedHashSet {
    /// Create an empty set with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create an empty set with `count` shards (at least one).
    pub fn with_shards(count: usize) -> Self {
        let shards = (0..count.max(1))
            .map(|_| Mutex::new(FxHashSet::default()))
            .collect();
        Self { shards }
    }

    #[inline]
    fn shard(&self, key: u64) -> MutexGuard<'_, FxHashSet<u64>> {
        // Fibonacci mixing so sequential keys spread across shards
        let mixed = key.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32;
        let index = (mixed as usize) % self.shards.len();
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `key`, returning `true` if it was not already present.
    #[inline]
    pub fn insert(&self, key: u64) -> bool {
        self.shard(key).insert(key)
    }

    /// Whether `key` is present.
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.shard(key).contains(&key)
    }

    /// Total number of keys across all shards.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Whether every shard is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key.
    pub fn clear(&self) {
        for s in self.shards.iter() {
            s.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Reserve room for about `total` keys, spread evenly.
    pub fn reserve(&self, total: usize) {
        let per_shard = total.div_ceil(self.shards.len());
        for s in self.shards.iter() {
            s.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .reserve(per_shard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_insert_is_check_and_set() {
        let set = ShardedHashSet::new();
        assert!(set.insert(42));
        assert!(!set.insert(42));
        assert!(set.contains(42));
        assert!(!set.contains(7));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear() {
        let set = ShardedHashSet::with_shards(3);
        set.reserve(100);
        for k in 0..50 {
            set.insert(k);
        }
        assert_eq!(set.len(), 50);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_concurrent_inserts_win_once() {
        let set = ShardedHashSet::new();
        // Every key is inserted by four tasks; exactly one insert may succeed
        let wins: usize = (0..4000u64)
            .into_par_iter()
            .map(|i| usize::from(set.insert(i % 1000)))
            .sum();
        assert_eq!(wins, 1000);
        assert_eq!(set.len(), 1000);
    }
}
