//! SQLite cache store implementation
//!
//! This module provides a SQLite-based implementation of the CacheStore trait,
//! used when cached responses should survive process restarts.

use crate::cache::schema::initialize_schema;
use crate::cache::traits::{CacheError, CacheResult, CacheStore};
use crate::cache::CacheEntry;
use crate::url::CacheKey;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite backing store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a cache database at `path`
    pub fn new(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CacheStore for SqliteStore {
    fn load(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;

        let row = conn
            .query_row(
                "SELECT body, status, fetched_at, fresh_until FROM responses WHERE cache_key = ?1",
                params![key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((body, status, fetched_at, fresh_until)) = row else {
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            body,
            status,
            fetched_at: parse_timestamp(key, &fetched_at)?,
            fresh_until: parse_timestamp(key, &fresh_until)?,
        }))
    }

    fn store(&self, key: &CacheKey, entry: &CacheEntry) -> CacheResult<()> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO responses (cache_key, body, status, fetched_at, fresh_until)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.as_str(),
                entry.body,
                entry.status,
                entry.fetched_at.to_rfc3339(),
                entry.fresh_until.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute("DELETE FROM responses", [])?;
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn parse_timestamp(key: &CacheKey, raw: &str) -> CacheResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CacheError::Corrupt {
            key: key.to_string(),
            message: format!("bad timestamp '{}': {}", raw, e),
        })
}
