//! Database schema for the persistent response cache

/// SQL schema for the cache database
pub const SCHEMA_SQL: &str = r#"
-- Cached responses keyed by canonical request URL
CREATE TABLE IF NOT EXISTS responses (
    cache_key TEXT PRIMARY KEY NOT NULL,
    body TEXT NOT NULL,
    status INTEGER NOT NULL,
    fetched_at TEXT NOT NULL,
    fresh_until TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_responses_fresh_until ON responses(fresh_until);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The SQLite connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
