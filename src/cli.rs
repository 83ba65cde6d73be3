//! Command-line interface parsing for the rates proxy
//!
//! Every option can also be supplied through an environment variable (or a
//! `.env` file), which is how the proxy is usually deployed.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::resource::DEFAULT_UPSTREAM_BASE_URL;

/// Where cached values are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Process memory; lost on restart
    Memory,
    /// One JSON file per resource; file mtime is the fetch time
    Disk,
}

/// Which staleness rule to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Fresh while younger than the TTL
    Rolling,
    /// Expires shortly after every hour boundary
    Aligned,
}

/// Rates Proxy - cache in front of the Open Exchange Rates API
#[derive(Parser, Debug)]
#[command(name = "rates-proxy")]
#[command(about = "Caching HTTP proxy for exchange rates and the currency list")]
#[command(version)]
pub struct Cli {
    /// Open Exchange Rates app id
    #[arg(long, env = "APP_ID", hide_env_values = true)]
    pub app_id: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long = "bind", env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: String,

    /// Base URL of the upstream API
    #[arg(long, env = "UPSTREAM_BASE_URL", default_value = DEFAULT_UPSTREAM_BASE_URL)]
    pub upstream: String,

    /// Cache backend
    #[arg(long, env = "CACHE_BACKEND", value_enum, default_value_t = BackendKind::Memory)]
    pub backend: BackendKind,

    /// Directory for the disk backend (defaults to the platform cache dir)
    #[arg(long, env = "CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Staleness policy
    #[arg(long, env = "CACHE_POLICY", value_enum, default_value_t = PolicyKind::Rolling)]
    pub policy: PolicyKind,

    /// Cache lifetime in seconds for the rolling policy
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 3600)]
    pub ttl_secs: u64,

    /// Minutes past the hour at which the aligned policy expires values
    #[arg(long, env = "CACHE_OFFSET_MINUTES", default_value_t = 5)]
    pub offset_minutes: u32,

    /// Return upstream JSON as-is on success instead of wrapping it in `data`
    #[arg(long, env = "RAW_SUCCESS")]
    pub raw_success: bool,
}
