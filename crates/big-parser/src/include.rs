//! Include statement scanning.
//!
//! An include statement asks for the blocks of a layout position:
//!
//! ```text
//! <big:include position="sidebar" class="well"/>
//! ```
//!
//! `position` is mandatory, must be the first attribute and must not be
//! empty. Tags that do not fit are left in the markup untouched.

use std::sync::LazyLock;

use regex::Regex;

use crate::attrs::parse_attributes;

/// Matches an include statement. Group 1 is the position, group 2 the
/// remaining attribute text.
static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<big:include\s+position="([^"]+)"\s*(.*?)/>"#).unwrap()
});

/// One include statement found in markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeStatement {
    /// Full tag text as written.
    pub text: String,
    pub position: String,
    /// Additional attributes in source order.
    pub attrs: Vec<(String, String)>,
}

impl IncludeStatement {
    /// Attribute value by key. The last occurrence wins.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Every include statement in `markup`.
///
/// Tags with identical text collapse into one entry, kept at the position
/// of their first occurrence. Substituting that entry's text replaces every
/// occurrence.
pub fn scan(markup: &str) -> Vec<IncludeStatement> {
    let mut statements: Vec<IncludeStatement> = Vec::new();

    for caps in INCLUDE_RE.captures_iter(markup) {
        let statement = IncludeStatement {
            text: caps[0].to_owned(),
            position: caps[1].to_owned(),
            attrs: parse_attributes(&caps[2]),
        };
        match statements.iter_mut().find(|s| s.text == statement.text) {
            Some(existing) => *existing = statement,
            None => statements.push(statement),
        }
    }

    statements
}
