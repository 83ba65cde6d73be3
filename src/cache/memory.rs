//! In-memory cache backend
//!
//! One slot per resource, each behind its own read/write lock. Slots are
//! created up front and never removed.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::backend::{CacheBackend, CacheEntry, StoreError};
use crate::resource::Resource;

/// Process-local cache holding the last fetched value per resource
#[derive(Debug)]
pub struct MemoryBackend {
    slots: HashMap<&'static str, RwLock<Option<CacheEntry>>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates an empty slot for every known resource
    pub fn new() -> Self {
        Self::with_keys(Resource::ALL.iter().map(Resource::key))
    }

    /// Creates an empty slot for each of the given keys
    pub fn with_keys(keys: impl IntoIterator<Item = &'static str>) -> Self {
        let slots = keys.into_iter().map(|key| (key, RwLock::new(None))).collect();
        Self { slots }
    }

    fn slot(&self, key: &str) -> Result<&RwLock<Option<CacheEntry>>, StoreError> {
        self.slots
            .get(key)
            .ok_or_else(|| StoreError::UnknownKey(key.to_string()))
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let guard = self.slot(key)?.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    async fn write(
        &self,
        key: &str,
        value: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let entry = CacheEntry {
            value: value.clone(),
            fetched_at,
        };
        let mut guard = self.slot(key)?.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_returns_none_before_first_write() {
        let backend = MemoryBackend::new();
        let result = backend.read("latest").await.expect("Read should succeed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let value = json!({"base": "USD", "rates": {"EUR": 0.92}});

        backend.write("latest", &value, now).await.expect("Write should succeed");

        let entry = backend
            .read("latest")
            .await
            .expect("Read should succeed")
            .expect("Entry should exist");
        assert_eq!(entry.value, value);
        assert_eq!(entry.fetched_at, now);
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let backend = MemoryBackend::new();
        backend
            .write("latest", &json!({"rates": {}}), Utc::now())
            .await
            .expect("Write should succeed");

        let currencies = backend.read("currencies").await.expect("Read should succeed");
        assert!(currencies.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_timestamp() {
        let backend = MemoryBackend::new();
        let first = Utc::now();
        let second = first + chrono::Duration::minutes(5);

        backend.write("currencies", &json!({"USD": "US Dollar"}), first).await.unwrap();
        backend.write("currencies", &json!({"EUR": "Euro"}), second).await.unwrap();

        let entry = backend.read("currencies").await.unwrap().unwrap();
        assert_eq!(entry.value, json!({"EUR": "Euro"}));
        assert_eq!(entry.fetched_at, second);
    }

    #[tokio::test]
    async fn test_unknown_key_is_an_error() {
        let backend = MemoryBackend::new();
        let result = backend.read("historical").await;
        assert!(matches!(result, Err(StoreError::UnknownKey(ref k)) if k == "historical"));
    }
}
