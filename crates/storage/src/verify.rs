//! Completeness and size verification. Read-only and idempotent.

use crate::error::{EngineError, EngineResult};
use gantry_core::paths;
use gantry_core::UploadId;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Verify that all chunks of an upload are present.
///
/// Counts the entries in the upload's staging directory and compares against
/// the declared total. A missing directory counts as zero entries, not a
/// hard error, so verification before the first chunk simply reports
/// `NotComplete`.
pub async fn chunk_count(
    chunks_root: &Path,
    uuid: &UploadId,
    total_chunks: u32,
) -> EngineResult<()> {
    let dir = paths::chunk_dir(chunks_root, uuid);
    let found = match fs::read_dir(&dir).await {
        Ok(mut entries) => {
            let mut count = 0usize;
            while entries
                .next_entry()
                .await
                .map_err(EngineError::Store)?
                .is_some()
            {
                count += 1;
            }
            count
        }
        Err(e) if e.kind() == ErrorKind::NotFound => 0,
        Err(e) => return Err(EngineError::Store(e)),
    };

    if found == total_chunks as usize {
        Ok(())
    } else {
        Err(EngineError::NotComplete {
            found,
            expected: total_chunks,
        })
    }
}

/// Verify that the assembled file has exactly the declared size.
///
/// A missing file reports a mismatch with `actual = 0` rather than a
/// separate error; the caller asked "is the result the right size" and the
/// answer is no either way.
pub async fn assembled_size(
    uploads_root: &Path,
    uuid: &UploadId,
    name: &str,
    expected: u64,
) -> EngineResult<()> {
    let path = paths::final_path(uploads_root, uuid, name);
    let actual = match fs::metadata(&path).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => 0,
        Err(e) => return Err(EngineError::Store(e)),
    };

    if actual == expected {
        Ok(())
    } else {
        Err(EngineError::SizeMismatch { expected, actual })
    }
}
