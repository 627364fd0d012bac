//! CLI error types.

use folio_build::BuildError;
use folio_config::ConfigError;
use folio_server::ServerError;

/// Exit status when the preview port is already taken.
const EXIT_PORT_IN_USE: i32 = 98;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Server(#[from] ServerError),
}

impl CliError {
    /// Process exit status for this error.
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            Self::Server(ServerError::PortInUse { .. }) => EXIT_PORT_IN_USE,
            _ => 1,
        }
    }
}
