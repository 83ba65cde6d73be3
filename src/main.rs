//! Rates Proxy - cache in front of the Open Exchange Rates API
//!
//! Serves `/api/latest` and `/api/currencies`, refreshing each from upstream
//! at most once per cache window.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use rates_proxy::cache::CacheCoordinator;
use rates_proxy::cli::Cli;
use rates_proxy::config::Config;
use rates_proxy::fetch::HttpFetcher;
use rates_proxy::server::{self, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before the subscriber so RUST_LOG can come from it
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rates_proxy=info".into()),
        )
        .with_target(true)
        .init();

    if let Err(e) = dotenv {
        debug!("No .env file loaded: {}", e);
    }

    let cli = Cli::parse();

    let config = match Config::from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = config.cache_backend()?;
    let fetcher = Arc::new(HttpFetcher::new()?);

    let coordinator = CacheCoordinator::new(backend, fetcher, config.policy, config.upstream);
    info!(
        backend = ?config.backend,
        policy = ?coordinator.policy(),
        style = ?config.style,
        "Cache configured"
    );

    let state = AppState::new(Arc::new(coordinator), config.style);

    let listener = TcpListener::bind(config.listen_addr).await?;
    server::serve(listener, state).await?;
    Ok(())
}
