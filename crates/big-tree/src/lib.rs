//! Nested-set trees for the Big content engine.
//!
//! This crate provides:
//! - [`TreeStore`]: rebuilds disjoint trees from flat rows ordered by
//!   `(tree, lft)` and answers root/item/parent queries from its cache
//! - [`MenuManager`]: menus partitioned by tree, with the default menu item
//!   and the active item
//! - [`CategoryManager`]: category trees partitioned by module, created on
//!   first use
//!
//! Roots have `lft == 1` and `depth == 0`.
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> Result<(), big_tree::TreeError> {
//! use std::sync::Arc;
//! use big_storage::{MemoryStorage, MenuData, NodeRow};
//! use big_tree::{MenuManager, MenuOptions};
//!
//! let storage = MemoryStorage::new()
//!     .with_menu(NodeRow::new(1, 1, 1, 4, 0, MenuData::new("Main", "", "")))
//!     .with_menu(NodeRow::new(2, 1, 2, 3, 1, MenuData::new("Home", "home", "site/index").as_default()));
//! let menus = MenuManager::new(Arc::new(storage), MenuOptions::default());
//! menus.initialize()?;
//!
//! assert_eq!(menus.get_default()?.data.alias, "home");
//! # Ok(())
//! # }
//! ```

mod category;
mod error;
mod menu;
mod node;
mod store;

pub use category::CategoryManager;
pub use error::TreeError;
pub use menu::{MenuField, MenuManager, MenuOptions, SearchItem};
pub use node::{Category, MenuItem, TreeNode};
pub use store::TreeStore;
