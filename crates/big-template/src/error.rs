use big_storage::StorageError;

/// Error returned by template loading.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// No template with this id.
    #[error("Template not found: {0}")]
    NotFound(i64),
    /// No template is flagged as default.
    #[error("No default template has been set")]
    NoDefault,
    /// The stored `positions` column is not a JSON object of id lists.
    #[error("Invalid positions in template {id}: {source}")]
    InvalidPositions {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
