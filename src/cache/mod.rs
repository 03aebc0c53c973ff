//! Response cache module
//!
//! This module maps canonical request keys to previously fetched responses:
//! - `ResponseCache` applies the freshness window on read (lazy expiry)
//! - `CacheStore` is the backing-store seam
//! - `MemoryStore` keeps entries for the process lifetime
//! - `SqliteStore` persists entries across runs

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CacheError, CacheResult, CacheStore};

use crate::config::{CacheBackend, CacheConfig};
use crate::state::{to_chrono, Clock};
use crate::url::CacheKey;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A stored response plus its freshness metadata
///
/// Entries are immutable once stored; a re-fetch replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Raw response body
    pub body: String,

    /// HTTP status the body was served with
    pub status: u16,

    /// When the response was fetched
    pub fetched_at: DateTime<Utc>,

    /// After this instant the entry must be treated as a miss
    pub fresh_until: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.fresh_until
    }
}

/// Opens the backing store selected by configuration
pub fn open_store(config: &CacheConfig) -> CacheResult<Arc<dyn CacheStore>> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        CacheBackend::Sqlite => Ok(Arc::new(SqliteStore::new(Path::new(&config.path))?)),
    }
}

/// Freshness-aware view over a backing store
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { store, ttl, clock }
    }

    /// Returns a fresh entry for `key`
    ///
    /// Absent, expired and unreadable entries are all reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = match self.store.load(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        if entry.is_fresh(self.clock.now()) {
            Some(entry)
        } else {
            tracing::debug!(
                "Cached entry for {} expired at {}",
                key,
                entry.fresh_until.to_rfc3339()
            );
            None
        }
    }

    /// Stores a freshly fetched response and returns the entry that was built
    ///
    /// A store failure is logged and otherwise ignored.
    pub fn put(&self, key: &CacheKey, body: String, status: u16) -> CacheEntry {
        let fetched_at = self.clock.now();
        let entry = CacheEntry {
            body,
            status,
            fetched_at,
            fresh_until: fetched_at
                .checked_add_signed(to_chrono(self.ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        match self.store.store(key, &entry) {
            Ok(()) => tracing::info!("Cached response for {}", key),
            Err(e) => tracing::warn!("Cache write failed for {}: {}", key, e),
        }

        entry
    }

    /// Removes every entry from the backing store
    pub fn clear(&self) -> CacheResult<()> {
        self.store.clear()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ManualClock;

    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn load(&self, _key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
            Err(CacheError::Poisoned)
        }

        fn store(&self, _key: &CacheKey, _entry: &CacheEntry) -> CacheResult<()> {
            Err(CacheError::Poisoned)
        }

        fn clear(&self) -> CacheResult<()> {
            Err(CacheError::Poisoned)
        }

        fn len(&self) -> CacheResult<usize> {
            Err(CacheError::Poisoned)
        }
    }

    fn cache_with(clock: Arc<ManualClock>, ttl: Duration) -> ResponseCache {
        ResponseCache::new(Arc::new(MemoryStore::new()), ttl, clock)
    }

    fn key() -> CacheKey {
        CacheKey::from_canonical("https://example.test/data")
    }

    #[test]
    fn test_hit_within_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(clock.clone(), Duration::from_secs(60));

        cache.put(&key(), "<p>body</p>".to_string(), 200);
        clock.advance(Duration::from_secs(59));

        let hit = cache.get(&key()).unwrap();
        assert_eq!(hit.body, "<p>body</p>");
        assert_eq!(hit.status, 200);
    }

    #[test]
    fn test_miss_at_deadline() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(clock.clone(), Duration::from_secs(60));

        cache.put(&key(), "body".to_string(), 200);
        clock.advance(Duration::from_secs(60));

        assert!(cache.get(&key()).is_none());
    }

    #[test]
    fn test_absent_is_miss() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(clock, Duration::from_secs(60));
        assert!(cache.get(&key()).is_none());
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(clock, Duration::ZERO);
        cache.put(&key(), "body".to_string(), 200);
        assert!(cache.get(&key()).is_none());
    }

    #[test]
    fn test_put_sets_deadline_from_fetch_time() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(clock.clone(), Duration::from_secs(90));

        let entry = cache.put(&key(), "body".to_string(), 200);
        assert_eq!(entry.fetched_at, clock.now());
        assert_eq!(
            entry.fresh_until - entry.fetched_at,
            chrono::Duration::seconds(90)
        );
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(clock.clone(), Duration::from_secs(10_000_000_000_000));

        let entry = cache.put(&key(), "body".to_string(), 200);
        assert!(entry.fresh_until > entry.fetched_at);

        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert!(cache.get(&key()).is_some());
    }

    #[test]
    fn test_refetch_replaces_entry() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(clock.clone(), Duration::from_secs(10));

        cache.put(&key(), "old".to_string(), 200);
        clock.advance(Duration::from_secs(20));
        assert!(cache.get(&key()).is_none());

        cache.put(&key(), "new".to_string(), 200);
        assert_eq!(cache.get(&key()).unwrap().body, "new");
    }

    #[test]
    fn test_broken_store_degrades_to_miss() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::new(Arc::new(BrokenStore), Duration::from_secs(60), clock);

        let entry = cache.put(&key(), "body".to_string(), 200);
        assert_eq!(entry.body, "body");
        assert!(cache.get(&key()).is_none());
    }

    #[test]
    fn test_open_memory_store() {
        let store = open_store(&CacheConfig::default()).unwrap();
        assert!(store.is_empty().unwrap());
    }
}
