//! Assembly of staged chunks into the final output file.

use crate::error::{EngineError, EngineResult};
use gantry_core::paths;
use gantry_core::upload::validate_file_name;
use gantry_core::UploadId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Concatenate all staged chunks of an upload into its final file.
///
/// Chunk file names are zero-padded by the path scheme, so a lexicographic
/// sort of the staging directory is index order. The chunks are streamed, in
/// that order, into a temp file in the final directory, fsynced, renamed
/// onto the final path, and only then is the staging subtree reclaimed.
///
/// Fails fast with `NothingToAssemble` when the staging directory is missing
/// or empty: a second assembly attempt after reclamation must not touch an
/// already assembled file. On any I/O failure the staging subtree is left
/// intact for retry and a partial result is never visible at the final path.
#[instrument(skip(chunks_root, uploads_root), fields(uuid = %uuid))]
pub async fn assemble(
    chunks_root: &Path,
    uploads_root: &Path,
    uuid: &UploadId,
    name: &str,
) -> EngineResult<PathBuf> {
    validate_file_name(name)?;

    let source_dir = paths::chunk_dir(chunks_root, uuid);
    let chunk_names = list_chunk_names(&source_dir).await?;
    if chunk_names.is_empty() {
        return Err(EngineError::NothingToAssemble(*uuid));
    }

    let final_dir = paths::final_dir(uploads_root, uuid);
    fs::create_dir_all(&final_dir)
        .await
        .map_err(EngineError::Assemble)?;

    let dest = paths::final_path(uploads_root, uuid, name);
    let temp_path = final_dir.join(format!("{name}.tmp.{}", Uuid::new_v4()));

    let result = concat_into(&source_dir, &chunk_names, &temp_path).await;
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(EngineError::Assemble(e));
    }

    if let Err(e) = fs::rename(&temp_path, &dest).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(EngineError::Assemble(e));
    }

    fs::remove_dir_all(&source_dir)
        .await
        .map_err(EngineError::Assemble)?;

    tracing::info!(chunks = chunk_names.len(), dest = %dest.display(), "upload assembled");
    Ok(dest)
}

/// List regular files in the staging directory, sorted lexicographically.
async fn list_chunk_names(source_dir: &Path) -> EngineResult<Vec<String>> {
    let mut entries = match fs::read_dir(source_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(EngineError::Assemble(e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(EngineError::Assemble)? {
        let file_type = entry.file_type().await.map_err(EngineError::Assemble)?;
        if file_type.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Stream every chunk, in order, into `temp_path`, reading each exactly once.
async fn concat_into(
    source_dir: &Path,
    chunk_names: &[String],
    temp_path: &Path,
) -> std::io::Result<()> {
    let mut out = fs::File::create(temp_path).await?;
    for chunk_name in chunk_names {
        let mut chunk = fs::File::open(source_dir.join(chunk_name)).await?;
        tokio::io::copy(&mut chunk, &mut out).await?;
    }
    out.flush().await?;
    out.sync_all().await
}
