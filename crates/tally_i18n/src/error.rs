//! Error types for translation lookup

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Template placeholders and supplied arguments disagree
    #[error("Format mismatch: template expects {expected} argument(s), {supplied} supplied")]
    FormatMismatch { expected: usize, supplied: usize },

    /// Template contains a conversion the formatter does not know
    #[error("Unsupported placeholder at byte {position}: {placeholder}")]
    BadPlaceholder { position: usize, placeholder: String },

    /// Catalog source could not be read
    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl From<serde_json::Error> for TranslationError {
    fn from(err: serde_json::Error) -> Self {
        TranslationError::Catalog(err.to_string())
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(err: std::io::Error) -> Self {
        TranslationError::Catalog(err.to_string())
    }
}
