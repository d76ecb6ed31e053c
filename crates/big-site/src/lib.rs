//! Page assembly for the Big content engine.
//!
//! This crate provides:
//! - [`Site`]: runs the page assembly pipeline over the managers
//! - [`BlockRegistry`]: rendered block fragments per position
//! - [`MenuRouter`]: SEO URLs from menu aliases
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use big_site::{Site, SiteSettings};
//! use big_storage::MemoryStorage;
//!
//! let storage = Arc::new(MemoryStorage::from_json_file("site.json".as_ref())?);
//! let site = Site::new(storage, SiteSettings::default());
//! site.initialize()?;
//!
//! let page = site.render(r#"<main><big:include position="main"/></main>"#, 0)?;
//! # Ok(())
//! # }
//! ```

mod blocks;
mod error;
mod router;
mod site;

pub use blocks::BlockRegistry;
pub use error::SiteError;
pub use router::MenuRouter;
pub use site::{RenderedPage, Site, SiteSettings};
