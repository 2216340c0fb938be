//! Upload lifecycle controller.

use crate::error::{EngineError, EngineResult};
use crate::{assemble, store, verify};
use gantry_core::config::StorageConfig;
use gantry_core::paths;
use gantry_core::{ChunkUpload, FileUpload, UploadId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

/// Staging area for in-flight request payloads, kept under the chunks root
/// so moves into the chunk store stay on one filesystem.
const STAGING_DIR: &str = ".staging";

/// Outcome of handling one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Stored; more chunks are still outstanding (or another caller is
    /// already assembling).
    Pending,
    /// This chunk completed the set and the upload was assembled.
    Assembled(PathBuf),
}

/// Orchestrates the store / verify / assemble lifecycle for all uploads.
///
/// Chunk stores are lock-free: chunks of one upload land at disjoint paths
/// and directory creation races are benign. Assembly and finalization
/// serialize per upload identity through a keyed mutex registry, with
/// completeness re-checked under the lock so exactly one caller assembles.
pub struct UploadEngine {
    chunks_root: PathBuf,
    uploads_root: PathBuf,
    staging_root: PathBuf,
    assembly_locks: Mutex<HashMap<UploadId, Arc<Mutex<()>>>>,
}

impl UploadEngine {
    /// Create the engine, validating the configuration and creating the
    /// storage roots.
    pub async fn new(config: &StorageConfig) -> EngineResult<Self> {
        config.validate()?;

        let chunks_root = config.chunks_root.clone();
        let uploads_root = config.uploads_root.clone();
        let staging_root = chunks_root.join(STAGING_DIR);

        fs::create_dir_all(&chunks_root)
            .await
            .map_err(EngineError::Store)?;
        fs::create_dir_all(&uploads_root)
            .await
            .map_err(EngineError::Store)?;
        fs::create_dir_all(&staging_root)
            .await
            .map_err(EngineError::Store)?;

        Ok(Self {
            chunks_root,
            uploads_root,
            staging_root,
            assembly_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Root directory for staged chunks.
    pub fn chunks_root(&self) -> &Path {
        &self.chunks_root
    }

    /// Root directory for assembled uploads.
    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// A fresh path in the staging area for an incoming request payload.
    /// Staging on the engine's volume keeps the later move atomic.
    pub fn new_staging_path(&self) -> PathBuf {
        self.staging_root.join(format!("{}.part", Uuid::new_v4()))
    }

    /// Store one chunk and, if it completed the set, assemble the upload.
    ///
    /// A raced caller that loses the assembly lock re-verifies, observes the
    /// reclaimed staging directory, and reports `Pending`.
    #[instrument(skip(self, staged), fields(uuid = %chunk.uuid, index = chunk.index, total = chunk.total_chunks))]
    pub async fn handle_chunk(
        &self,
        chunk: &ChunkUpload,
        staged: &Path,
    ) -> EngineResult<ChunkOutcome> {
        store::store_chunk(&self.chunks_root, chunk, staged).await?;

        match verify::chunk_count(&self.chunks_root, &chunk.uuid, chunk.total_chunks).await {
            Ok(()) => {}
            Err(EngineError::NotComplete { .. }) => return Ok(ChunkOutcome::Pending),
            Err(e) => return Err(e),
        }

        let lock = self.assembly_lock(&chunk.uuid).await;
        let guard = lock.lock().await;

        // Another caller may have assembled while we waited.
        match verify::chunk_count(&self.chunks_root, &chunk.uuid, chunk.total_chunks).await {
            Ok(()) => {}
            Err(EngineError::NotComplete { .. }) => return Ok(ChunkOutcome::Pending),
            Err(e) => return Err(e),
        }

        let path = assemble::assemble(
            &self.chunks_root,
            &self.uploads_root,
            &chunk.uuid,
            &chunk.name,
        )
        .await?;

        drop(guard);
        self.release_assembly_lock(&chunk.uuid).await;
        Ok(ChunkOutcome::Assembled(path))
    }

    /// Store a whole, unchunked upload.
    #[instrument(skip(self, staged), fields(uuid = %file.uuid))]
    pub async fn handle_file(&self, file: &FileUpload, staged: &Path) -> EngineResult<PathBuf> {
        store::store_file(&self.uploads_root, file, staged).await
    }

    /// Remove an upload's assembled output. Idempotent: deleting an upload
    /// that does not exist succeeds.
    #[instrument(skip(self), fields(uuid = %uuid))]
    pub async fn delete_upload(&self, uuid: &UploadId) -> EngineResult<()> {
        let dir = paths::final_dir(&self.uploads_root, uuid);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Delete(e)),
        }
    }

    /// Out-of-band completion check for an upload.
    ///
    /// If staged chunks remain (the assembling chunk request failed after
    /// its verify), this verifies completeness and assembles them; either
    /// way the assembled file is then checked against the declared size.
    /// On a mismatch the artifact is reported against but not deleted.
    #[instrument(skip(self), fields(uuid = %uuid))]
    pub async fn finalize(
        &self,
        uuid: &UploadId,
        name: &str,
        total_chunks: u32,
        total_size: u64,
    ) -> EngineResult<PathBuf> {
        let lock = self.assembly_lock(uuid).await;
        let guard = lock.lock().await;

        let result = self
            .finalize_under_lock(uuid, name, total_chunks, total_size)
            .await;

        // Finalization is the end of the lifecycle either way; a later
        // caller gets a fresh lock and re-verifies from disk.
        drop(guard);
        self.release_assembly_lock(uuid).await;
        result
    }

    async fn finalize_under_lock(
        &self,
        uuid: &UploadId,
        name: &str,
        total_chunks: u32,
        total_size: u64,
    ) -> EngineResult<PathBuf> {
        let staging = paths::chunk_dir(&self.chunks_root, uuid);
        if fs::try_exists(&staging).await.map_err(EngineError::Store)? {
            verify::chunk_count(&self.chunks_root, uuid, total_chunks).await?;
            assemble::assemble(&self.chunks_root, &self.uploads_root, uuid, name).await?;
        }

        verify::assembled_size(&self.uploads_root, uuid, name, total_size).await?;
        Ok(paths::final_path(&self.uploads_root, uuid, name))
    }

    /// Store a chunk without the completion check.
    pub async fn store_chunk(&self, chunk: &ChunkUpload, staged: &Path) -> EngineResult<PathBuf> {
        store::store_chunk(&self.chunks_root, chunk, staged).await
    }

    /// Store a whole file.
    pub async fn store_file(&self, file: &FileUpload, staged: &Path) -> EngineResult<PathBuf> {
        store::store_file(&self.uploads_root, file, staged).await
    }

    /// Verify that all of an upload's chunks are present.
    pub async fn verify_chunk_count(&self, uuid: &UploadId, total_chunks: u32) -> EngineResult<()> {
        verify::chunk_count(&self.chunks_root, uuid, total_chunks).await
    }

    /// Verify the assembled file's size.
    pub async fn verify_size(&self, uuid: &UploadId, name: &str, expected: u64) -> EngineResult<()> {
        verify::assembled_size(&self.uploads_root, uuid, name, expected).await
    }

    /// Assemble an upload's staged chunks.
    pub async fn assemble(&self, uuid: &UploadId, name: &str) -> EngineResult<PathBuf> {
        assemble::assemble(&self.chunks_root, &self.uploads_root, uuid, name).await
    }

    /// Get or create the assembly lock for an identity.
    async fn assembly_lock(&self, uuid: &UploadId) -> Arc<Mutex<()>> {
        let mut locks = self.assembly_locks.lock().await;
        locks.entry(*uuid).or_default().clone()
    }

    /// Drop an identity's lock entry so the registry only holds uploads
    /// that are still in flight.
    async fn release_assembly_lock(&self, uuid: &UploadId) {
        self.assembly_locks.lock().await.remove(uuid);
    }
}
