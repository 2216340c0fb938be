//! On-disk path scheme for staged chunks and assembled files.
//!
//! Chunk files are named `<zero-padded index>_<original name>` where the pad
//! width is the decimal digit count of the total chunk count. A plain
//! lexicographic sort of the staging directory therefore yields chunks in
//! index order, which is what the assembler relies on.
//!
//! Layout (stable contract):
//! - staging: `<chunks_root>/<uuid>/<padded index>_<name>`
//! - final:   `<uploads_root>/<uuid>/<name>`

use crate::upload::UploadId;
use std::path::{Path, PathBuf};

/// Decimal digit count of `total_chunks`, used as the zero-pad width.
pub fn pad_width(total_chunks: u32) -> usize {
    (total_chunks.checked_ilog10().unwrap_or(0) + 1) as usize
}

/// File name for one staged chunk.
pub fn chunk_file_name(index: u32, total_chunks: u32, name: &str) -> String {
    let width = pad_width(total_chunks);
    format!("{index:0width$}_{name}")
}

/// Staging directory for an upload's chunks.
pub fn chunk_dir(chunks_root: &Path, uuid: &UploadId) -> PathBuf {
    chunks_root.join(uuid.to_string())
}

/// Full path of one staged chunk.
pub fn chunk_path(
    chunks_root: &Path,
    uuid: &UploadId,
    index: u32,
    total_chunks: u32,
    name: &str,
) -> PathBuf {
    chunk_dir(chunks_root, uuid).join(chunk_file_name(index, total_chunks, name))
}

/// Directory holding an upload's assembled file.
pub fn final_dir(uploads_root: &Path, uuid: &UploadId) -> PathBuf {
    uploads_root.join(uuid.to_string())
}

/// Full path of an upload's assembled file.
pub fn final_path(uploads_root: &Path, uuid: &UploadId, name: &str) -> PathBuf {
    final_dir(uploads_root, uuid).join(name)
}
