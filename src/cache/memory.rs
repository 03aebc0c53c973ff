use crate::cache::traits::{CacheError, CacheResult, CacheStore};
use crate::cache::CacheEntry;
use crate::url::CacheKey;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory backing store, lives for the process lifetime
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &CacheKey, entry: &CacheEntry) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.clone(), entry.clone());
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.clear();
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.len())
    }
}
