//! Templates assign content blocks to named layout positions.
//!
//! A [`Template`] maps each position name to the ordered block ids shown
//! there. [`TemplateManager`] loads templates from a
//! [`TemplateSource`](big_storage::TemplateSource) and tracks the one
//! active for the current page.

mod error;
mod manager;
mod template;

pub use error::TemplateError;
pub use manager::{DEFAULT_TEXT, TemplateManager};
pub use template::Template;
