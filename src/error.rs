use thiserror::Error;

use crate::query::SourceType;

/// Errors surfaced by the extraction pipeline.
///
/// Only structural failures end up here. Bad values inside individual
/// records are absorbed into sentinel cells and never abort an extraction.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The raw document could not be parsed as JSON
    #[error("malformed document: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    /// The query descriptor could not be deserialized
    #[error("malformed query descriptor: {0}")]
    MalformedQuery(#[source] serde_json::Error),

    /// No parser exists for the requested source type
    #[error("unsupported source type: {0}")]
    UnsupportedSource(SourceType),

    /// A JSONPath expression failed to parse
    #[error("invalid JSONPath expression at position {position}: {message}")]
    InvalidJsonPath { position: usize, message: String },
}

impl ParseError {
    pub fn invalid_path(position: usize, message: impl Into<String>) -> Self {
        ParseError::InvalidJsonPath {
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
