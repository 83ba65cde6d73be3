//! On-disk cache backend
//!
//! Stores each resource as `<key>.json` in a cache directory. The file holds
//! the raw fetched JSON document and its modification time is the fetch
//! timestamp, so a missing file means "never fetched".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use filetime::FileTime;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use super::backend::{CacheBackend, CacheEntry, StoreError};

/// Persists cache entries as JSON files
///
/// All file I/O (stat, read, write) is serialized through a single lock so a
/// reader never sees a half-written file from this process. Writes also go
/// through a temporary file and a rename.
#[derive(Debug)]
pub struct DiskBackend {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    io_lock: Mutex<()>,
}

impl DiskBackend {
    /// Creates a DiskBackend using the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/rates-proxy/` on Linux, or equivalent XDG path on other platforms.
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "rates-proxy")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a DiskBackend with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            io_lock: Mutex::new(()),
        }
    }

    /// Directory holding the cache files
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!(".{}.json.tmp", key))
    }
}

#[async_trait]
impl CacheBackend for DiskBackend {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let _guard = self.io_lock.lock().await;
        let path = self.cache_path(key);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let modified = metadata
            .modified()
            .map_err(|e| StoreError::io(&path, e))?;

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        match serde_json::from_slice(&content) {
            Ok(value) => Ok(Some(CacheEntry {
                value,
                fetched_at: DateTime::<Utc>::from(modified),
            })),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
                Ok(None)
            }
        }
    }

    async fn write(
        &self,
        key: &str,
        value: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_vec(value)?;

        let _guard = self.io_lock.lock().await;
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| StoreError::io(&self.cache_dir, e))?;

        let temp = self.temp_path(key);
        fs::write(&temp, json)
            .await
            .map_err(|e| StoreError::io(&temp, e))?;
        filetime::set_file_mtime(&temp, FileTime::from_system_time(fetched_at.into()))
            .map_err(|e| StoreError::io(&temp, e))?;

        let path = self.cache_path(key);
        fs::rename(&temp, &path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }
}
