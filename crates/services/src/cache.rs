use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self) -> bool {
        self.created.elapsed() <= self.ttl
    }
}

/// Keyed TTL cache over a `DashMap`.
///
/// Expired entries are invisible to [`get`](Self::get) but stay around for
/// [`get_stale`](Self::get_stale) until a compaction sweep drops them.
/// Entries are replaced wholesale, never mutated; concurrent writers to the
/// same key race last-write-wins.
pub struct TtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    compact_threshold: usize,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(compact_threshold: usize) -> Self {
        Self {
            entries: DashMap::new(),
            compact_threshold,
        }
    }

    /// Fresh value for `key`, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .filter(|e| e.is_fresh())
            .map(|e| e.value.clone())
    }

    /// Value for `key` regardless of freshness. Fallback path only.
    pub fn get_stale(&self, key: &str) -> Option<T> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: T, ttl: Duration) {
        if self.entries.len() > self.compact_threshold {
            self.compact();
        }
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created: Instant::now(),
                ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sweep expired entries. Amortized via the insert path; growth is
    /// otherwise bounded by the TTLs.
    fn compact(&self) {
        self.entries.retain(|_, e| e.is_fresh());
    }
}
