use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::eviction::{EvictionPolicy, EvictionStore, FifoStore, LfuStore, LruStore};
use crate::key::CacheKey;

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Option<Duration>,
    hit_count: u64,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Option<Duration>) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
            hit_count: 0,
        }
    }

    fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.inserted_at.elapsed() > ttl)
    }
}

/// Cache storage keyed by [`CacheKey`], with per-entry TTL and a pluggable
/// eviction policy (spec §4.5).
///
/// TTL is carried per entry rather than uniformly on the store, since a key
/// strategy may scale it per request (content-class multiplier, halved for
/// user-specific keys — spec §4.5).
pub(crate) struct CacheStore<V> {
    store: Box<dyn EvictionStore<CacheKey, CacheEntry<V>>>,
    default_ttl: Option<Duration>,
}

impl<V: Clone + Send + 'static> CacheStore<V> {
    pub(crate) fn new(capacity: usize, default_ttl: Option<Duration>, policy: EvictionPolicy) -> Self {
        let store: Box<dyn EvictionStore<CacheKey, CacheEntry<V>>> = match policy {
            EvictionPolicy::Lru => Box::new(LruStore::new(capacity)),
            EvictionPolicy::Lfu => Box::new(LfuStore::new(capacity)),
            EvictionPolicy::Fifo => Box::new(FifoStore::new(capacity)),
        };
        Self { store, default_ttl }
    }

    /// Returns the value and its hit count so far, or `None` on a miss or
    /// expired entry. The cache never returns an expired entry (spec §3, §8).
    pub(crate) fn get(&mut self, key: &CacheKey) -> Option<(V, u64)> {
        let entry = self.store.get(key)?;
        if entry.is_expired() {
            self.store.remove(key);
            return None;
        }
        let value = entry.value.clone();
        let hits = entry.hit_count + 1;
        self.store.insert(*key, {
            let mut updated = entry.clone();
            updated.hit_count = hits;
            updated
        });
        Some((value, hits))
    }

    /// Inserts `value` with an explicit TTL (falling back to the store's
    /// default when `None`), returning the evicted entry if the cache was
    /// full.
    pub(crate) fn insert(&mut self, key: CacheKey, value: V, ttl: Option<Duration>) -> Option<V> {
        let ttl = ttl.or(self.default_ttl);
        self.store
            .insert(key, CacheEntry::new(value, ttl))
            .map(|(_, e)| e.value)
    }

    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
    }
}
