//! Error types

use thiserror::Error;

/// Plugin lifecycle and action errors
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener is already running on {0}")]
    AlreadyRunning(std::net::SocketAddr),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("listener failed: {0}")]
    Listener(#[from] std::io::Error),

    #[error("listener task panicked or was cancelled: {0}")]
    ListenerTask(#[from] tokio::task::JoinError),
}

/// Device driver errors
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no device mapped to selector {0:?}")]
    UnknownSelector(String),
}

/// Invalid `SELECTOR=VALUE` mapping on the command line
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid selector mapping {0:?}, expected SELECTOR=TARGET[:CHANNEL[:MODE]]")]
pub struct SelectorMappingError(pub String);
