//! Refresh coordination for cached resources
//!
//! `CacheCoordinator::get` serves a fresh value straight from the backend, or
//! fetches a new one from upstream and commits it before returning. The
//! upstream call happens outside any backend lock. Concurrent callers that all
//! see a stale slot each fetch; the last write wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::backend::{CacheBackend, StoreError};
use super::policy::StalenessPolicy;
use crate::fetch::{FetchError, Fetcher};
use crate::resource::{Resource, Upstream};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A refresh failed
///
/// The detail is for logs only; clients get a fixed per-resource message.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Upstream could not be fetched or decoded
    #[error("Refresh failed: {0}")]
    Fetch(#[from] FetchError),

    /// The cache store could not be read or written
    #[error("Cache store failed: {0}")]
    Store(#[from] StoreError),
}

/// Serves resources from the cache, refreshing them from upstream when stale
pub struct CacheCoordinator {
    backend: Arc<dyn CacheBackend>,
    fetcher: Arc<dyn Fetcher>,
    policy: StalenessPolicy,
    upstream: Upstream,
    clock: Arc<dyn Clock>,
}

impl CacheCoordinator {
    /// Create a coordinator using the system clock
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        fetcher: Arc<dyn Fetcher>,
        policy: StalenessPolicy,
        upstream: Upstream,
    ) -> Self {
        Self {
            backend,
            fetcher,
            policy,
            upstream,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for staleness checks and fetch timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Staleness policy applied to every resource
    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    /// Returns the current value for `resource`
    ///
    /// # Returns
    /// * `Ok(Value)` - The cached value if fresh, otherwise the newly fetched one
    /// * `Err(CacheError)` - If a refresh was needed and failed. A stale value is
    ///   never returned in its place.
    pub async fn get(&self, resource: Resource) -> Result<Value, CacheError> {
        let key = resource.key();

        match self.backend.read(key).await? {
            Some(entry) if self.policy.is_fresh(Some(entry.fetched_at), self.clock.now()) => {
                debug!(resource = key, fetched_at = %entry.fetched_at, "Cache hit");
                return Ok(entry.value);
            }
            Some(entry) => {
                debug!(resource = key, fetched_at = %entry.fetched_at, "Cache entry is stale");
            }
            None => {
                debug!(resource = key, "Cache slot is empty");
            }
        }

        self.refresh(resource).await
    }

    /// Fetches `resource` from upstream and commits it to the backend
    async fn refresh(&self, resource: Resource) -> Result<Value, CacheError> {
        let key = resource.key();
        let url = self.upstream.url_for(resource);

        info!(resource = key, "Refreshing from upstream");
        let value = self.fetcher.fetch(&url).await.map_err(|e| {
            warn!(resource = key, error = %e, "Upstream fetch failed");
            e
        })?;

        let fetched_at = self.clock.now();
        self.backend
            .write(key, &value, fetched_at)
            .await
            .map_err(|e| {
                warn!(resource = key, error = %e, "Failed to store refreshed value");
                e
            })?;

        info!(
            resource = key,
            fetched_at = %fetched_at,
            expires_at = ?self.policy.expires_at(fetched_at),
            "Cache refreshed"
        );
        Ok(value)
    }
}
