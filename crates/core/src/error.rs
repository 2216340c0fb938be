//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid upload id: {0}")]
    InvalidUploadId(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("invalid chunk index: {index} (total chunks: {total_chunks})")]
    InvalidChunkIndex { index: u32, total_chunks: u32 },

    #[error("invalid chunk count: {0} (must be at least 1)")]
    InvalidChunkCount(u32),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
