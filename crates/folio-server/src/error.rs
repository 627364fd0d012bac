//! Preview server errors.

use std::net::SocketAddr;

use folio_build::BuildError;

/// Errors that stop the preview server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address {host}:{port}")]
    InvalidAddress { host: String, port: u16 },

    #[error("Address {addr} is already in use")]
    PortInUse { addr: SocketAddr },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Initial build failed: {0}")]
    InitialBuild(#[source] BuildError),

    #[error("Initial build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to watch source directory: {0}")]
    Watch(#[from] notify::Error),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
