use thiserror::Error;

/// Errors raised by a named cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Only GET requests can be cached, got {0}")]
    UnsupportedMethod(String),

    #[error("Request for {url} failed: {reason}")]
    AddFailed { url: String, reason: String },

    #[error("Cache storage error: {0}")]
    Storage(String),
}

/// Errors raised by the network transport.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the host's notification primitives.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Notification error: {0}")]
    Notification(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid scope URL {scope}: {reason}")]
    InvalidScope { scope: String, reason: String },

    #[error("Invalid locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },
}

/// Errors surfaced by the worker's lifecycle handlers.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
