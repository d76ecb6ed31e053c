//! Storage abstraction for the Big content engine.
//!
//! This crate is the persistence boundary. Managers never talk to a
//! database directly; they consume the row-source traits defined here:
//!
//! - [`TreeSource`] returns nested-set rows (menus, categories) in the three
//!   query shapes the tree engine needs
//! - [`TemplateSource`] loads and saves template assignments
//! - [`BlockSource`] renders block ids into HTML fragments
//!
//! # Architecture
//!
//! The crate provides:
//! - Typed row/record structs ([`NodeRow`], [`MenuData`], [`CategoryData`],
//!   [`TemplateRecord`], [`BlockRecord`]) with lenient decoding of the loose
//!   column types a SQL driver hands back (`"1"` vs `1`, JSON-in-a-string)
//! - [`StorageError`] for unified error handling across backends
//! - [`MemoryStorage`], an in-memory backend that doubles as the test fake
//!   and can be loaded from a JSON dataset file
//! - [`demote_previous_default`], the pre-commit step that keeps the
//!   "is default" flag unique
//!
//! # Example
//!
//! ```ignore
//! use big_storage::{MemoryStorage, RowFilter, TreeSource, MenuData};
//!
//! let storage = MemoryStorage::from_json_file("data.json".as_ref())?;
//! let rows = TreeSource::<MenuData>::fetch_tree(&storage, &RowFilter::IsDefault)?;
//! ```

mod default_flag;
mod memory;
mod row;
mod storage;

pub use default_flag::{DefaultFlag, demote_previous_default};
pub use memory::{Dataset, MemoryStorage, MemoryTree};
pub use row::{
    BlockRecord, CategoryData, MenuData, NodeData, NodeRow, Positions, PositionsField,
    TemplateRecord,
};
pub use storage::{
    BlockSource, RowFilter, StorageError, StorageErrorKind, TemplateFilter, TemplateSource,
    TreeSource,
};
