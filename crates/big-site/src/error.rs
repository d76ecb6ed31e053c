use big_parser::ParserError;
use big_storage::StorageError;
use big_template::TemplateError;
use big_tree::TreeError;

/// Error returned when assembling a page.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    /// Block rendering failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
