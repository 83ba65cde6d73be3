//! Runtime configuration derived from CLI arguments and the environment

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use reqwest::Url;
use thiserror::Error;

use crate::cache::{CacheBackend, DiskBackend, MemoryBackend, StalenessPolicy};
use crate::cli::{BackendKind, Cli, PolicyKind};
use crate::resource::Upstream;
use crate::server::ResponseStyle;

/// Error types for configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No app id was supplied
    #[error("APP_ID environment variable is not set")]
    MissingAppId,

    /// The upstream base URL is not a valid absolute URL
    #[error("Invalid upstream URL '{0}'")]
    InvalidUpstream(String),

    /// The bind address is not an IP address
    #[error("Invalid bind address '{0}'")]
    InvalidBindAddress(String),

    /// The rolling TTL must be positive
    #[error("Cache TTL must be greater than zero")]
    InvalidTtl,

    /// The aligned offset must fall inside the hour
    #[error("Cache offset must be between 0 and 59 minutes, got {0}")]
    InvalidOffset(u32),

    /// No cache directory was given and none could be derived
    #[error("Could not determine a cache directory; set CACHE_DIR")]
    NoCacheDir,
}

/// Validated configuration for the proxy
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// Upstream API location and app id
    pub upstream: Upstream,
    pub backend: BackendKind,
    pub cache_dir: Option<PathBuf>,
    pub policy: StalenessPolicy,
    pub style: ResponseStyle,
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with validated settings
    /// * `Err(ConfigError)` if a required value is missing or out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let app_id = cli
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingAppId)?;

        let base = Url::parse(&cli.upstream)
            .map_err(|_| ConfigError::InvalidUpstream(cli.upstream.clone()))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUpstream(cli.upstream.clone()));
        }

        let ip: IpAddr = cli
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(cli.bind.clone()))?;

        let policy = match cli.policy {
            PolicyKind::Rolling => {
                if cli.ttl_secs == 0 {
                    return Err(ConfigError::InvalidTtl);
                }
                let secs = i64::try_from(cli.ttl_secs).map_err(|_| ConfigError::InvalidTtl)?;
                let ttl = Duration::try_seconds(secs).ok_or(ConfigError::InvalidTtl)?;
                StalenessPolicy::Rolling { ttl }
            }
            PolicyKind::Aligned => {
                if cli.offset_minutes >= 60 {
                    return Err(ConfigError::InvalidOffset(cli.offset_minutes));
                }
                StalenessPolicy::Aligned {
                    offset_minutes: cli.offset_minutes,
                }
            }
        };

        let style = if cli.raw_success {
            ResponseStyle::Raw
        } else {
            ResponseStyle::Envelope
        };

        Ok(Config {
            listen_addr: SocketAddr::new(ip, cli.port),
            upstream: Upstream::new(base, app_id),
            backend: cli.backend,
            cache_dir: cli.cache_dir.clone(),
            policy,
            style,
        })
    }

    /// Builds the configured cache backend
    pub fn cache_backend(&self) -> Result<Arc<dyn CacheBackend>, ConfigError> {
        match self.backend {
            BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
            BackendKind::Disk => {
                let disk = match &self.cache_dir {
                    Some(dir) => DiskBackend::with_dir(dir.clone()),
                    None => DiskBackend::new().ok_or(ConfigError::NoCacheDir)?,
                };
                Ok(Arc::new(disk))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["rates-proxy"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("Arguments should parse")
    }

    #[test]
    fn test_missing_app_id_is_an_error() {
        let mut cli = parse(&[]);
        cli.app_id = None;
        assert!(matches!(Config::from_cli(&cli), Err(ConfigError::MissingAppId)));
    }

    #[test]
    fn test_blank_app_id_is_an_error() {
        let cli = parse(&["--app-id", "   "]);
        assert!(matches!(Config::from_cli(&cli), Err(ConfigError::MissingAppId)));
    }

    #[test]
    fn test_valid_config() {
        let cli = parse(&[
            "--app-id",
            "abc",
            "--port",
            "9090",
            "--bind",
            "127.0.0.1",
            "--upstream",
            "http://localhost:1234/api",
            "--policy",
            "rolling",
            "--ttl-secs",
            "600",
        ]);
        let config = Config::from_cli(&cli).expect("Config should be valid");

        assert_eq!(config.listen_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(
            config.upstream.url_for(Resource::Rates),
            "http://localhost:1234/api/latest.json?app_id=abc"
        );
        assert_eq!(
            config.policy,
            StalenessPolicy::Rolling {
                ttl: Duration::minutes(10)
            }
        );
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let cli = parse(&["--app-id", "abc", "--policy", "rolling", "--ttl-secs", "0"]);
        assert!(matches!(Config::from_cli(&cli), Err(ConfigError::InvalidTtl)));
    }

    #[test]
    fn test_offset_must_be_within_hour() {
        let cli = parse(&["--app-id", "abc", "--policy", "aligned", "--offset-minutes", "60"]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::InvalidOffset(60))
        ));
    }

    #[test]
    fn test_aligned_policy() {
        let cli = parse(&["--app-id", "abc", "--policy", "aligned", "--offset-minutes", "7"]);
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(config.policy, StalenessPolicy::Aligned { offset_minutes: 7 });
    }

    #[test]
    fn test_invalid_upstream_rejected() {
        let cli = parse(&["--app-id", "abc", "--upstream", "not a url"]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::InvalidUpstream(_))
        ));
    }

    #[test]
    fn test_invalid_bind_rejected() {
        let cli = parse(&["--app-id", "abc", "--bind", "localhost"]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::InvalidBindAddress(_))
        ));
    }

    #[test]
    fn test_raw_success_selects_raw_style() {
        let cli = parse(&["--app-id", "abc", "--raw-success"]);
        assert_eq!(Config::from_cli(&cli).unwrap().style, ResponseStyle::Raw);
    }

    #[test]
    fn test_disk_backend_with_explicit_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().to_string_lossy().to_string();
        let cli = parse(&["--app-id", "abc", "--backend", "disk", "--cache-dir", &dir]);
        let config = Config::from_cli(&cli).unwrap();
        assert!(config.cache_backend().is_ok());
    }
}
