//! Process-local cache store.

use super::{namespace_of, validate_key, CacheResult, CacheStore};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory `CacheStore`; contents live as long as the store value.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        validate_key(key)?;
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> CacheResult<()> {
        validate_key(key)?;
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        Ok(self.lock().remove(key).is_some())
    }

    fn clear_namespace(&self, namespace: &str) -> CacheResult<usize> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| namespace_of(key) != namespace);
        Ok(before - entries.len())
    }

    fn clear(&self) -> CacheResult<usize> {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}
