//! Bounded TTL cache with hit/miss/eviction statistics.
//!
//! Expiry is lazy: an entry older than the TTL is dropped when it is next
//! looked up; there is no background sweeper. When full, an insert evicts
//! the least-reused entry, oldest first.
//!
//! Time comes from `tokio::time::Instant`, so tests can drive expiry with a
//! paused clock.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// A cached value and its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: Instant,
    pub hit_count: u64,
    /// Insertion sequence; breaks `created_at` ties toward the oldest.
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn eviction_rank(&self) -> (u64, Instant, u64) {
        (self.hit_count, self.created_at, self.seq)
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Capacity evictions plus TTL expiries.
    pub evictions: u64,
    pub total_lookups: u64,
    pub size: usize,
    pub capacity: usize,
    pub hit_rate: f64,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    next_seq: u64,
}

/// A thread-safe key → value cache bounded by size and age.
///
/// Every operation runs under one mutex, so check-evict-insert is atomic.
pub struct DecisionCache<V> {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> DecisionCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity.min(1024)),
                hits: 0,
                misses: 0,
                evictions: 0,
                next_seq: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up `key`, counting a hit or a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let expired = inner
            .entries
            .get(key)
            .map(|entry| now.duration_since(entry.created_at) > self.ttl);

        let Some(expired) = expired else {
            inner.misses += 1;
            return None;
        };

        if expired {
            inner.entries.remove(key);
            inner.evictions += 1;
            inner.misses += 1;
            debug!(key = %short(key), "Cache entry expired");
            return None;
        }

        inner.hits += 1;
        let entry = inner.entries.get_mut(key)?;
        entry.hit_count += 1;
        Some(entry.value.clone())
    }

    /// Insert `value` under `key`, evicting one entry first if full.
    pub fn put(&self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }

        let key = key.into();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = inner.next_seq;
        inner.next_seq += 1;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let victim = inner
                .entries
                .values()
                .min_by_key(|e| e.eviction_rank())
                .map(|e| e.key.clone());
            if let Some(victim) = victim {
                inner.entries.remove(&victim);
                inner.evictions += 1;
                debug!(key = %short(&victim), "Cache entry evicted (capacity)");
            }
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                value,
                created_at: Instant::now(),
                hit_count: 0,
                seq,
            },
        );
    }

    /// Whether `key` is present (expired or not). Does not touch statistics.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(key)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clear();
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let total_lookups = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            total_lookups,
            size: inner.entries.len(),
            capacity: self.capacity,
            hit_rate: if total_lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / total_lookups as f64
            },
        }
    }
}

fn short(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}
