//! CLI error types.

use quire_config::ConfigError;
use quire_highlight::ProfileError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Invalid language profile: {0}")]
    Profile(#[from] ProfileError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Cache(String),
}
