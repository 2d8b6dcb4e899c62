//! Bounded in-memory cache with per-entry time-to-live.
//!
//! Entries older than the TTL are treated as absent on lookup and physically
//! removed either lazily by `get` or by a periodic `sweep`. When an insert
//! pushes the cache past its limit the single oldest entry is evicted.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

/// Key for a cached action URL: the parse line plus the page URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(endpoint: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// Hit/miss counters and current size, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    limit: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, limit: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            limit,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the stored value if it is younger than the TTL.
    ///
    /// A stale entry is removed as a side effect and reported as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Inserts or overwrites `key`, evicting the oldest entry if the cache
    /// grows past its limit.
    pub fn put(&self, key: K, value: V) {
        self.put_at(key, value, Instant::now());
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Keeps only the entries whose key satisfies `keep`; returns how many
    /// were removed.
    pub fn retain(&self, mut keep: impl FnMut(&K) -> bool) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| keep(key));
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    pub(crate) fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        let fresh = match entries.get(key) {
            Some(entry) if self.is_fresh(entry, now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        drop(entries);

        if fresh.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        fresh
    }

    pub(crate) fn put_at(&self, key: K, value: V, now: Instant) {
        let mut entries = self.lock();
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
            },
        );

        if entries.len() > self.limit {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                trace!("Cache limit {} reached, evicted oldest entry", self.limit);
            }
        }
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        before - entries.len()
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) < self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
