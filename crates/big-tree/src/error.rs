use big_storage::StorageError;

/// Error returned by tree loading and lookups.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Requested id or key does not exist after an attempted load.
    #[error("Node not found: {0}")]
    NotFound(String),
    /// Row ordering or root-presence contract violated.
    #[error("Malformed tree: {0}")]
    MalformedTree(String),
    /// A required default node was never configured.
    #[error("No default {0} has been set")]
    NoDefault(&'static str),
    /// Caller passed a value the operation cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Row source failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
