//! Cache store traits and error types
//!
//! This module defines the trait interface for response cache backing stores
//! and associated error types.

use crate::cache::CacheEntry;
use crate::url::CacheKey;
use thiserror::Error;

/// Errors that can occur in a backing store
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt cache entry for {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error("Cache store lock poisoned")]
    Poisoned,
}

/// Result type for cache store operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for response cache backing stores
///
/// Implementations must be safe to share between tasks; each read and write
/// is atomic per key. Freshness is not the store's concern: it returns
/// whatever was last stored and the [`ResponseCache`](crate::cache::ResponseCache)
/// decides whether the entry is still usable.
pub trait CacheStore: Send + Sync {
    /// Loads the entry stored under `key`, if any
    fn load(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>>;

    /// Stores `entry` under `key`, replacing any previous entry wholesale
    fn store(&self, key: &CacheKey, entry: &CacheEntry) -> CacheResult<()>;

    /// Removes every stored entry
    fn clear(&self) -> CacheResult<()>;

    /// Number of stored entries, fresh or not
    fn len(&self) -> CacheResult<usize>;

    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}
