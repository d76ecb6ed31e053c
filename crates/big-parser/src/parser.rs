//! The page assembly parser.

use std::collections::HashMap;
use std::sync::Arc;

use big_router::{DEFAULT_ROUTE_PARAM, UrlRouter};

use crate::error::ParserError;
use crate::include::{IncludeStatement, scan};
use crate::replacements::Replacements;
use crate::urls::{prefix_base_url, rewrite_internal_urls};

/// Rendered block fragments per position name, in display order.
pub type BlocksByPosition = HashMap<String, Vec<String>>;

/// Substitutes include statements with block content and normalizes URLs.
///
/// A run goes through three stages on the in-flight document:
/// 1. scan include statements
/// 2. replace each with the joined fragments of its position, or remove it
/// 3. rewrite internal links through the [`UrlRouter`] and prefix the home
///    URL onto relative asset paths
///
/// The parser keeps no per-run state, so one instance serves any number of
/// concurrent runs.
///
/// # Example
///
/// ```
/// use big_parser::{BlocksByPosition, Parser};
///
/// let parser = Parser::new("http://example.com/");
/// let mut blocks = BlocksByPosition::new();
/// blocks.insert("top".to_owned(), vec!["<nav></nav>".to_owned()]);
///
/// let html = parser.run(r#"<big:include position="top"/><img src="a.png">"#, &blocks);
/// assert_eq!(html, r#"<nav></nav><img src="http://example.com/a.png">"#);
/// ```
pub struct Parser {
    home_url: String,
    route_param: String,
    router: Option<Arc<dyn UrlRouter>>,
}

impl Parser {
    /// Parser prefixing `home_url` onto relative URLs.
    #[must_use]
    pub fn new(home_url: impl Into<String>) -> Self {
        Self {
            home_url: home_url.into(),
            route_param: DEFAULT_ROUTE_PARAM.to_owned(),
            router: None,
        }
    }

    /// Rewrite internal links through `router`.
    #[must_use]
    pub fn with_router(mut self, router: Arc<dyn UrlRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Query parameter holding the route in internal links.
    #[must_use]
    pub fn with_route_param(mut self, route_param: impl Into<String>) -> Self {
        self.route_param = route_param.into();
        self
    }

    pub fn home_url(&self) -> &str {
        &self.home_url
    }

    /// Assemble `markup` with the given block fragments.
    pub fn run(&self, markup: &str, blocks: &BlocksByPosition) -> String {
        let mut document = markup.to_owned();

        let statements = scan(&document);
        let substituted = statements.len();
        Self::substitute(&mut document, &statements, blocks);
        let document = self.rewrite_urls(&document);

        tracing::debug!(statements = substituted, bytes = document.len(), "Parsed document");
        document
    }

    /// Like [`run`](Self::run) for raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::InvalidInput`] when `markup` is not UTF-8.
    pub fn run_bytes(&self, markup: &[u8], blocks: &BlocksByPosition) -> Result<String, ParserError> {
        let markup = std::str::from_utf8(markup)?;
        Ok(self.run(markup, blocks))
    }

    /// Include statements in `markup`, one per distinct tag text.
    pub fn include_statements(markup: &str) -> Vec<IncludeStatement> {
        scan(markup)
    }

    /// Distinct position names requested by `markup`, in document order.
    pub fn find_positions(markup: &str) -> Vec<String> {
        let mut positions: Vec<String> = Vec::new();
        for statement in scan(markup) {
            if !positions.contains(&statement.position) {
                positions.push(statement.position);
            }
        }
        positions
    }

    fn substitute(document: &mut String, statements: &[IncludeStatement], blocks: &BlocksByPosition) {
        let mut replacements = Replacements::with_capacity(statements.len());
        for statement in statements {
            let content = blocks
                .get(&statement.position)
                .map(|fragments| fragments.join("\n"))
                .unwrap_or_default();
            replacements.add(statement.text.as_str(), content);
        }
        replacements.apply(document);
    }

    fn rewrite_urls(&self, document: &str) -> String {
        let document = match &self.router {
            Some(router) => rewrite_internal_urls(document, router.as_ref(), &self.route_param),
            None => document.into(),
        };
        prefix_base_url(&document, &self.home_url).into_owned()
    }
}
