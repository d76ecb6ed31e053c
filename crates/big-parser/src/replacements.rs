//! Ordered text substitution for include statements.

/// Collects `(tag text, replacement)` pairs and applies them in order.
///
/// Each pair replaces every literal occurrence of its tag in the document
/// produced by the previous pairs.
///
/// # Example
///
/// ```
/// use big_parser::Replacements;
///
/// let mut html = r#"<big:include position="top"/><p>body</p>"#.to_owned();
/// let mut replacements = Replacements::new();
/// replacements.add(r#"<big:include position="top"/>"#, "<nav></nav>");
/// replacements.apply(&mut html);
///
/// assert_eq!(html, "<nav></nav><p>body</p>");
/// ```
#[derive(Debug, Default)]
pub struct Replacements {
    items: Vec<(String, String)>,
}

impl Replacements {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Register a substitution of every occurrence of `from` with `to`.
    pub fn add(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.items.push((from.into(), to.into()));
    }

    /// Apply all substitutions, consuming the collector.
    pub fn apply(self, html: &mut String) {
        for (from, to) in self.items {
            if !from.is_empty() && html.contains(&from) {
                *html = html.replace(&from, &to);
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
