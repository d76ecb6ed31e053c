//! CLI error types.

use big_config::ConfigError;
use big_site::SiteError;
use big_storage::StorageError;
use big_tree::TreeError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{0}")]
    Validation(String),
}
