//! Atomic placement of staged payloads into the chunk and final stores.

use crate::error::{EngineError, EngineResult};
use gantry_core::paths;
use gantry_core::{ChunkUpload, FileUpload};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;
use uuid::Uuid;

/// Move a staged chunk into its slot in the upload's staging directory.
///
/// The per-upload directory is created if absent; concurrent chunks of the
/// same upload race on this benignly. A failed move never leaves a partially
/// written destination. Returns the final chunk path.
#[instrument(skip(staged), fields(uuid = %chunk.uuid, index = chunk.index))]
pub async fn store_chunk(
    chunks_root: &Path,
    chunk: &ChunkUpload,
    staged: &Path,
) -> EngineResult<PathBuf> {
    let dest = paths::chunk_path(
        chunks_root,
        &chunk.uuid,
        chunk.index,
        chunk.total_chunks,
        &chunk.name,
    );
    place(staged, &dest).await.map_err(EngineError::Store)?;
    Ok(dest)
}

/// Move a staged whole-file payload directly into the final store.
#[instrument(skip(staged), fields(uuid = %file.uuid))]
pub async fn store_file(
    uploads_root: &Path,
    file: &FileUpload,
    staged: &Path,
) -> EngineResult<PathBuf> {
    let dest = paths::final_path(uploads_root, &file.uuid, &file.name);
    place(staged, &dest).await.map_err(EngineError::Store)?;
    Ok(dest)
}

/// Move `staged` to `dest` atomically, creating the parent directory.
///
/// `rename` only works within a filesystem; if it fails we fall back to
/// copying into a temp sibling of the destination, fsyncing, and renaming
/// that, so a reader never observes a half-written file at `dest`.
async fn place(staged: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    if fs::rename(staged, dest).await.is_ok() {
        return Ok(());
    }

    place_via_copy(staged, dest).await
}

/// Cross-device fallback: copy into a temp sibling of the destination,
/// fsync, rename, then drop the source.
async fn place_via_copy(staged: &Path, dest: &Path) -> std::io::Result<()> {
    let temp_path = dest.with_file_name(format!(
        "{}.tmp.{}",
        dest.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        Uuid::new_v4()
    ));

    let result = async {
        fs::copy(staged, &temp_path).await?;
        let file = fs::File::open(&temp_path).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, dest).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&temp_path).await;
        return result;
    }

    // The destination is durably in place; a leftover source is not a
    // store failure.
    if let Err(e) = fs::remove_file(staged).await {
        tracing::warn!(
            staged = %staged.display(),
            error = %e,
            "failed to remove staged source after copy"
        );
    }
    Ok(())
}
