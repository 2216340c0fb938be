//! Upload identities and upload records.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use uuid::Uuid;

/// Unique identifier for an upload.
///
/// The identity is supplied by the client and is never invented or rewritten
/// by the server. Its canonical hyphenated form is the directory key for both
/// the chunk staging area and the final store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(Uuid);

impl UploadId {
    /// Parse an upload id from its string form.
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::InvalidUploadId(format!("{s}: {e}")))
    }

    /// Generate a random upload id. Used by tests; real ids come from clients.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UploadId({})", self.0)
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a client-supplied file name as a single safe path component.
///
/// Rejects empty names, path separators, `..`, and anything else that does
/// not resolve to exactly one normal component.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidFileName("empty name".to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFileName(format!(
            "{name}: contains path separator"
        )));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Error::InvalidFileName(format!(
            "{name}: not a plain file name"
        ))),
    }
}

/// A single chunk of a chunked upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkUpload {
    /// Upload identity this chunk belongs to.
    pub uuid: UploadId,
    /// Zero-based chunk index.
    pub index: u32,
    /// Declared total number of chunks for this upload.
    pub total_chunks: u32,
    /// Declared total size of the assembled file, if the client sent one.
    pub total_size: Option<u64>,
    /// Original file name.
    pub name: String,
}

impl ChunkUpload {
    /// Create a chunk upload record, validating the index range and name.
    pub fn new(
        uuid: UploadId,
        index: u32,
        total_chunks: u32,
        total_size: Option<u64>,
        name: impl Into<String>,
    ) -> Result<Self> {
        if total_chunks == 0 {
            return Err(Error::InvalidChunkCount(total_chunks));
        }
        if index >= total_chunks {
            return Err(Error::InvalidChunkIndex {
                index,
                total_chunks,
            });
        }
        let name = name.into();
        validate_file_name(&name)?;
        Ok(Self {
            uuid,
            index,
            total_chunks,
            total_size,
            name,
        })
    }
}

/// A whole, unchunked upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    /// Upload identity.
    pub uuid: UploadId,
    /// Original file name.
    pub name: String,
}

impl FileUpload {
    /// Create a file upload record, validating the name.
    pub fn new(uuid: UploadId, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_file_name(&name)?;
        Ok(Self { uuid, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_id_round_trips_through_display() {
        let id = UploadId::random();
        let parsed = UploadId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn upload_id_rejects_garbage() {
        assert!(matches!(
            UploadId::parse("not-a-uuid"),
            Err(Error::InvalidUploadId(_))
        ));
    }

    #[test]
    fn file_name_validation_accepts_plain_names() {
        assert!(validate_file_name("report.pdf").is_ok());
        assert!(validate_file_name("archive.tar.gz").is_ok());
        assert!(validate_file_name("no extension").is_ok());
    }

    #[test]
    fn file_name_validation_rejects_traversal() {
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("a/b").is_err());
        assert!(validate_file_name("a\\b").is_err());
        assert!(validate_file_name(".").is_err());
    }

    #[test]
    fn chunk_upload_validates_index_range() {
        let uuid = UploadId::random();
        assert!(ChunkUpload::new(uuid, 0, 3, None, "f.bin").is_ok());
        assert!(ChunkUpload::new(uuid, 2, 3, None, "f.bin").is_ok());
        assert!(matches!(
            ChunkUpload::new(uuid, 3, 3, None, "f.bin"),
            Err(Error::InvalidChunkIndex { .. })
        ));
        assert!(matches!(
            ChunkUpload::new(uuid, 0, 0, None, "f.bin"),
            Err(Error::InvalidChunkCount(0))
        ));
    }

    #[test]
    fn file_upload_validates_name() {
        let uuid = UploadId::random();
        assert!(FileUpload::new(uuid, "ok.txt").is_ok());
        assert!(FileUpload::new(uuid, "../ok.txt").is_err());
    }
}
