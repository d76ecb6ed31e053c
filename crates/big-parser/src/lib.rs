//! Include statement parser for the Big content engine.
//!
//! Rendered layouts declare where blocks go with include statements:
//!
//! ```text
//! <big:include position="sidebar"/>
//! ```
//!
//! [`Parser::run`] replaces every statement with the fragments rendered for
//! its position and then normalizes URLs: internal `index.php?r=...` links
//! become public paths through a [`UrlRouter`](big_router::UrlRouter), and
//! relative `src`/`href`/`poster` values get the home URL prefixed.

mod attrs;
mod error;
mod include;
mod parser;
mod replacements;
mod urls;

pub use attrs::parse_attributes;
pub use error::ParserError;
pub use include::IncludeStatement;
pub use parser::{BlocksByPosition, Parser};
pub use replacements::Replacements;
pub use urls::{prefix_base_url, rewrite_internal_urls};
