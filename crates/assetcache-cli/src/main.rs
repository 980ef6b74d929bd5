//! assetcache - drive the offline asset cache worker from a terminal.
//!
//! Each command delivers one lifecycle event to the worker, using the
//! on-disk cache store and the real network, so the cache can be populated,
//! rotated and inspected without a browser.

mod commands;
mod host;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use assetcache_core::{DiskCacheStorage, HttpNetwork, OfflineWorker, WorkerConfig};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;
use host::ConsoleHost;

const CONFIG_ENV: &str = "ASSETCACHE_CONFIG";
const CACHE_DIR_ENV: &str = "ASSETCACHE_CACHE_DIR";
const LOG_DIR_ENV: &str = "ASSETCACHE_LOG_DIR";

/// Log file prefix inside the log directory
const LOG_FILE_PREFIX: &str = "assetcache.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard must be held until exit so buffered file logs flush.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config() -> Result<WorkerConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => WorkerConfig::load_from(&PathBuf::from(path)),
        None => WorkerConfig::load(),
    }
}

fn cache_dir(config: &WorkerConfig) -> PathBuf {
    match std::env::var_os(CACHE_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = load_config().context("Failed to load config")?;
    let root = cache_dir(&config);
    info!(cache = %config.cache_name, root = %root.display(), "assetcache starting");

    let storage = DiskCacheStorage::new(root.clone())
        .with_context(|| format!("Failed to open cache directory: {}", root.display()))?;
    let network = HttpNetwork::from_config(&config).context("Failed to build HTTP client")?;
    let worker = OfflineWorker::new(
        config,
        Arc::new(storage),
        Arc::new(network),
        Arc::new(ConsoleHost),
    );

    commands::run(command, &worker).await
}
