use std::time::Duration;

use thiserror::Error;

use crate::types::CorpusTag;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("max_results must be a positive integer, got {0}")]
    InvalidLimit(usize),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding timed out after {0:?}")]
    EmbeddingTimeout(Duration),

    #[error("Corpus '{corpus}' unavailable: {reason}")]
    CorpusUnavailable { corpus: CorpusTag, reason: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unknown source tag: {0}")]
    InvalidSourceTag(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
