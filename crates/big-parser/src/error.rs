/// Error returned by [`Parser::run_bytes`](crate::Parser::run_bytes).
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// Markup handed to the parser is not valid UTF-8.
    #[error("Parser input must be UTF-8 text: {0}")]
    InvalidInput(#[from] std::str::Utf8Error),
}
