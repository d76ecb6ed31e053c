//! Row-source traits and error types.
//!
//! Provides the [`TreeSource`], [`TemplateSource`] and [`BlockSource`]
//! traits that managers consume, along with [`StorageError`] for unified
//! error handling across backends.
//!
//! # Query shapes
//!
//! The nested-set engine needs exactly three queries from a tree table:
//! - every row, ordered by `(tree, lft)` ([`TreeSource::fetch_all`])
//! - every row of the tree containing the first row matching a filter,
//!   ordered by `lft` ([`TreeSource::fetch_tree`])
//! - a single row matching a filter ([`TreeSource::fetch_one`])

use std::collections::HashMap;

use crate::row::{NodeData, NodeRow, TemplateRecord};

/// Column filter for tree queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowFilter {
    /// `id = ?`
    Id(i64),
    /// `is_default = 1`
    IsDefault,
    /// `module = ?`
    Module(String),
    /// `alias = ?`
    Alias(String),
    /// `route = ?`
    Route(String),
}

impl RowFilter {
    /// Evaluate the filter against a row.
    pub fn matches<D: NodeData>(&self, row: &NodeRow<D>) -> bool {
        match self {
            Self::Id(id) => row.id == *id,
            Self::IsDefault => row.data.is_default(),
            Self::Module(module) => row.data.module() == Some(module.as_str()),
            Self::Alias(alias) => row.data.alias() == Some(alias.as_str()),
            Self::Route(route) => row.data.route() == Some(route.as_str()),
        }
    }
}

impl std::fmt::Display for RowFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id = {id}"),
            Self::IsDefault => write!(f, "is_default = 1"),
            Self::Module(module) => write!(f, "module = '{module}'"),
            Self::Alias(alias) => write!(f, "alias = '{alias}'"),
            Self::Route(route) => write!(f, "route = '{route}'"),
        }
    }
}

/// Template lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateFilter {
    Id(i64),
    /// The template flagged `is_default`.
    Default,
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Resource already exists (for create operations).
    AlreadyExists,
    /// Stored data could not be decoded.
    InvalidData,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// What was being accessed (table, id, file).
    pub context: Option<String>,
    /// Backend identifier (e.g., "Memory", "Json").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            context: None,
            backend: None,
            source: None,
        }
    }

    /// Attach context describing the failed access.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error with context.
    #[must_use]
    pub fn not_found(context: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_context(context)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, context: impl Into<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::AlreadyExists => StorageErrorKind::AlreadyExists,
            _ => StorageErrorKind::Other,
        };
        Self::new(kind).with_source(err).with_context(context)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (context)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::InvalidData => "Invalid data",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Nested-set table access.
///
/// Implementations must return rows in the documented order; the tree
/// engine consumes them as-is and never sorts.
pub trait TreeSource<D: NodeData>: Send + Sync {
    /// Every row, ordered by `(tree, lft)`.
    fn fetch_all(&self) -> Result<Vec<NodeRow<D>>, StorageError>;

    /// Every row sharing `tree` with the first row matching `filter`,
    /// ordered by `lft`. Empty when nothing matches.
    fn fetch_tree(&self, filter: &RowFilter) -> Result<Vec<NodeRow<D>>, StorageError>;

    /// A single row matching `filter`.
    fn fetch_one(&self, filter: &RowFilter) -> Result<Option<NodeRow<D>>, StorageError>;

    /// Insert a new root (`lft = 1`, `rgt = 2`, `depth = 0`) in a fresh tree.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::AlreadyExists`] when a root for the same
    /// module already exists.
    fn create_root(&self, data: D) -> Result<NodeRow<D>, StorageError>;
}

/// Template table access.
pub trait TemplateSource: Send + Sync {
    fn fetch(&self, filter: TemplateFilter) -> Result<Option<TemplateRecord>, StorageError>;

    fn fetch_all(&self) -> Result<Vec<TemplateRecord>, StorageError>;

    /// Insert or update a record.
    ///
    /// Implementations run [`demote_previous_default`](crate::demote_previous_default)
    /// before committing so at most one record stays flagged as default.
    fn save(&self, record: TemplateRecord) -> Result<TemplateRecord, StorageError>;
}

/// Block content provider.
pub trait BlockSource: Send + Sync {
    /// Render the given block ids.
    ///
    /// Returns a fragment for every id that exists and is active; other ids
    /// are absent from the map.
    fn render_blocks(&self, ids: &[i64]) -> Result<HashMap<i64, String>, StorageError>;
}
