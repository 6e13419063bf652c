//! In-memory page cache.

use leadscope_core::{CacheKey, ResultPage, SelectionTriple};
use lru::LruCache;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// What happens to cached pages when the selection triple changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationPolicy {
    /// Drop every cached page.
    #[default]
    ClearAll,
    /// Keep pages addressable by their full key so toggling a filter back
    /// and forth can reuse them.
    KeepEntries,
}

/// Configuration for the page cache.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Maximum number of pages held. `None` means unbounded.
    pub max_entries: Option<NonZeroUsize>,
    /// Behaviour on selection change.
    pub invalidation: InvalidationPolicy,
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the cache to `max` pages (0 leaves it unbounded).
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = NonZeroUsize::new(max);
        self
    }

    /// Set the invalidation policy.
    pub fn with_invalidation(mut self, policy: InvalidationPolicy) -> Self {
        self.invalidation = policy;
        self
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: u64,
    /// Number of lookups that found nothing.
    pub misses: u64,
    /// Number of pages written (including overwrites).
    pub inserts: u64,
    /// Number of pages dropped to respect `max_entries`.
    pub evictions: u64,
    /// Number of wholesale clears.
    pub clears: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Mapping from [`CacheKey`] to a fetched [`ResultPage`].
///
/// Pages are stored behind an `Arc` so the coordinator can hand the rendered
/// page out without copying it. A later `put` for the same key replaces the
/// page wholesale.
pub struct CacheStore {
    entries: LruCache<CacheKey, Arc<ResultPage>>,
    stats: CacheStats,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = match config.max_entries {
            Some(max) => LruCache::new(max),
            None => LruCache::unbounded(),
        };
        Self {
            entries,
            stats: CacheStats::default(),
        }
    }

    /// An unbounded store.
    pub fn unbounded() -> Self {
        Self::new(&CacheConfig::default())
    }

    /// Look up a page, marking it as recently used.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<ResultPage>> {
        match self.entries.get(key) {
            Some(page) => {
                self.stats.hits += 1;
                Some(Arc::clone(page))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Presence check that neither touches recency nor the hit counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Store a page, replacing any previous page for the same key.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn put(&mut self, key: CacheKey, page: impl Into<Arc<ResultPage>>) -> Option<CacheKey> {
        self.stats.inserts += 1;
        let replaced_or_evicted = self.entries.push(key.clone(), page.into());
        match replaced_or_evicted {
            Some((old_key, _)) if old_key != key => {
                self.stats.evictions += 1;
                Some(old_key)
            }
            _ => None,
        }
    }

    /// Drop every cached page.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.clears += 1;
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cached pages belonging to `triple`.
    pub fn count_for(&self, triple: &SelectionTriple) -> usize {
        self.entries
            .iter()
            .filter(|(key, _)| key.belongs_to(triple))
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("size", &self.entries.len())
            .field("cap", &self.entries.cap())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscope_core::{PaginationInfo, StatusFilter};

    fn page(n: u32) -> ResultPage {
        ResultPage::new(Vec::new(), PaginationInfo::from_counts(n, 50, 500))
    }

    fn key(n: u32) -> CacheKey {
        CacheKey::new(n, SelectionTriple::default())
    }

    #[test]
    fn test_get_put_roundtrip_counts_hits_and_misses() {
        let mut store = CacheStore::unbounded();
        assert!(store.get(&key(1)).is_none());

        store.put(key(1), page(1));
        let cached = store.get(&key(1)).unwrap();
        assert_eq!(cached.page(), 1);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let mut store = CacheStore::unbounded();
        store.put(key(1), page(1));
        let replacement = ResultPage::new(Vec::new(), PaginationInfo::from_counts(1, 50, 10));
        assert_eq!(store.put(key(1), replacement), None);

        assert_eq!(store.size(), 1);
        assert_eq!(store.get(&key(1)).unwrap().pagination.total_count, 10);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_bounded_store_evicts_least_recently_used() {
        let mut store = CacheStore::new(&CacheConfig::new().with_max_entries(2));
        store.put(key(1), page(1));
        store.put(key(2), page(2));
        // touch 1 so 2 becomes the eviction candidate
        assert!(store.get(&key(1)).is_some());

        let evicted = store.put(key(3), page(3));
        assert_eq!(evicted, Some(key(2)));
        assert!(store.contains(&key(1)));
        assert!(!store.contains(&key(2)));
        assert_eq!(store.size(), 2);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut store = CacheStore::unbounded();
        let other = SelectionTriple::default().with_status(StatusFilter::Scraped);
        store.put(key(1), page(1));
        store.put(CacheKey::new(1, other.clone()), page(1));
        assert_eq!(store.count_for(&other), 1);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.count_for(&other), 0);
        assert_eq!(store.stats().clears, 1);
    }

    #[test]
    fn test_zero_max_entries_means_unbounded() {
        let config = CacheConfig::new().with_max_entries(0);
        assert!(config.max_entries.is_none());
        let mut store = CacheStore::new(&config);
        for n in 1..=100 {
            store.put(key(n), page(n));
        }
        assert_eq!(store.size(), 100);
    }
}
