//! Storage seam shared by the in-memory and on-disk caches

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// A cached value together with the time it was fetched
///
/// The two fields are always written together.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The last successfully fetched document
    pub value: Value,
    /// When the document was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Errors raised by a cache backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or stat-ing a cache file failed
    #[error("Cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The value could not be serialized for storage
    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backend has no slot for this key
    #[error("Unknown cache key: {0}")]
    UnknownKey(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Storage for cache entries, keyed by resource key
///
/// Implementations are internally synchronized: a read never observes a value
/// without its matching timestamp, and no caller holds a reference into the
/// stored data.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the stored entry, or `None` if the key was never written
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Replaces the stored entry for `key`
    async fn write(
        &self,
        key: &str,
        value: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
