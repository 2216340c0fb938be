//! Storage engine error types.

use gantry_core::UploadId;
use thiserror::Error;

/// Upload engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to store chunk: {0}")]
    Store(#[source] std::io::Error),

    #[error("upload not complete: found {found} of {expected} chunks")]
    NotComplete { found: usize, expected: u32 },

    #[error("failed to assemble upload: {0}")]
    Assemble(#[source] std::io::Error),

    #[error("nothing to assemble for upload {0}")]
    NothingToAssemble(UploadId),

    #[error("size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("failed to delete upload: {0}")]
    Delete(#[source] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] gantry_core::Error),
}

impl EngineError {
    /// Whether a client should retry the same request.
    ///
    /// Only a failed store is retryable in place; everything else either
    /// needs a fresh upload or is an in-progress signal.
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Whether a client should reset and restart the upload from scratch.
    pub fn should_reset(&self) -> bool {
        matches!(
            self,
            Self::Assemble(_) | Self::NothingToAssemble(_) | Self::SizeMismatch { .. }
        )
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
