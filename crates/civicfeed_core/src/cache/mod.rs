//! Injected key-value cache stores.
//!
//! # Responsibility
//! - Replace hidden global caches with an explicit `CacheStore` seam.
//! - Provide in-memory and SQLite-backed implementations.
//! - Provide key helpers for coordinate and contact lookups.
//!
//! # Invariants
//! - Entries persist until explicitly removed, cleared or force-refreshed.
//! - Keys are non-blank; the text before the first `:` is the namespace.
//! - Cached values and full keys are never logged.

pub mod memory;
pub mod sqlite;

use crate::db::DbError;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;

pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

pub type CacheResult<T> = Result<T, CacheError>;

const NAMESPACE_SEPARATOR: char = ':';
const COORDINATE_NAMESPACE: &str = "geo";

#[derive(Debug)]
pub enum CacheError {
    InvalidKey(String),
    Db(DbError),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(message) => write!(f, "invalid cache key: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidKey(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value store injected into components that cache lookups.
pub trait CacheStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> CacheResult<()>;
    /// Returns whether an entry was removed.
    fn remove(&self, key: &str) -> CacheResult<bool>;
    /// Removes every entry in `namespace`; returns the removed count.
    fn clear_namespace(&self, namespace: &str) -> CacheResult<usize>;
    /// Removes every entry; returns the removed count.
    fn clear(&self) -> CacheResult<usize>;
}

/// Returns the namespace part of `key` (empty when there is none).
pub fn namespace_of(key: &str) -> &str {
    key.split_once(NAMESPACE_SEPARATOR)
        .map_or("", |(namespace, _)| namespace)
}

pub(crate) fn validate_key(key: &str) -> CacheResult<()> {
    if key.trim().is_empty() {
        return Err(CacheError::InvalidKey("key cannot be blank".to_string()));
    }
    Ok(())
}

/// Builds a cache key for a coordinate rounded to two decimal places.
///
/// Nearby lookups (roughly 1 km apart) share one entry.
pub fn coordinate_key(latitude: f64, longitude: f64) -> CacheResult<String> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(CacheError::InvalidKey(
            "coordinates must be finite".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(CacheError::InvalidKey(format!(
            "coordinate out of range: {latitude},{longitude}"
        )));
    }

    Ok(format!(
        "{COORDINATE_NAMESPACE}{NAMESPACE_SEPARATOR}{:.2}{NAMESPACE_SEPARATOR}{:.2}",
        round_coordinate(latitude),
        round_coordinate(longitude)
    ))
}

fn round_coordinate(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid `-0.00` keys.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Returns the cached value for `key`, fetching and storing it on a miss.
///
/// `force_refresh` skips the lookup and overwrites any cached value.
///
/// # Errors
/// - Returns the fetch error unchanged; nothing is stored in that case.
/// - Returns store failures converted into `E`.
pub async fn get_or_fetch<S, F, Fut, E>(
    store: &S,
    key: &str,
    force_refresh: bool,
    fetch: F,
) -> Result<String, E>
where
    S: CacheStore + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, E>>,
    E: From<CacheError>,
{
    let namespace = namespace_of(key);
    if !force_refresh {
        if let Some(value) = store.get(key)? {
            debug!("event=cache_lookup module=cache status=hit namespace={namespace}");
            return Ok(value);
        }
    }

    debug!(
        "event=cache_lookup module=cache status={} namespace={namespace}",
        if force_refresh { "refresh" } else { "miss" }
    );
    let value = fetch().await?;
    store.put(key, &value)?;
    Ok(value)
}
