//! Cache for upstream API responses
//!
//! This module holds one slot per [`Resource`](crate::resource::Resource) and
//! the logic that decides when a slot must be refreshed. Values are opaque JSON
//! documents stored alongside the time they were fetched, either in memory or
//! as files on disk whose modification time is the fetch timestamp.
//!
//! A failed refresh is reported as an error even when a stale value exists;
//! stale data is never served.

mod backend;
mod coordinator;
mod disk;
mod memory;
mod policy;

pub use backend::{CacheBackend, CacheEntry, StoreError};
pub use coordinator::{CacheCoordinator, CacheError, Clock, SystemClock};
pub use disk::DiskBackend;
pub use memory::MemoryBackend;
pub use policy::StalenessPolicy;
