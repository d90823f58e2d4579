//! SQLite-backed persistent cache store.
//!
//! # Invariants
//! - Rows live in `cache_entries`, created by versioned migrations.
//! - `put` is an upsert; `updated_at` tracks the last write.

use super::{namespace_of, validate_key, CacheResult, CacheStore};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// `CacheStore` persisted in one SQLite database.
pub struct SqliteCacheStore {
    conn: Connection,
}

impl SqliteCacheStore {
    /// Opens (creating if needed) a cache database file.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    pub fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries;", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        validate_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT cache_value FROM cache_entries WHERE cache_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> CacheResult<()> {
        validate_key(key)?;
        self.conn.execute(
            "INSERT INTO cache_entries (cache_key, cache_value, namespace)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET
                cache_value = excluded.cache_value,
                namespace = excluded.namespace,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value, namespace_of(key)],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let changed = self
            .conn
            .execute("DELETE FROM cache_entries WHERE cache_key = ?1;", [key])?;
        Ok(changed > 0)
    }

    fn clear_namespace(&self, namespace: &str) -> CacheResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM cache_entries WHERE namespace = ?1;", [namespace])?;
        Ok(changed)
    }

    fn clear(&self) -> CacheResult<usize> {
        let changed = self.conn.execute("DELETE FROM cache_entries;", [])?;
        Ok(changed)
    }
}
