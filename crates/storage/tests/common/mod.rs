//! Common test utilities and fixtures.

use gantry_core::config::StorageConfig;
use gantry_core::ChunkUpload;
use gantry_storage::{EngineResult, UploadEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// An engine backed by a temp directory that lives as long as the harness.
pub struct TestEngine {
    _temp: TempDir,
    pub engine: Arc<UploadEngine>,
}

impl TestEngine {
    pub async fn new() -> EngineResult<Self> {
        let temp = TempDir::new().expect("failed to create temp dir");
        let config = StorageConfig {
            chunks_root: temp.path().join("chunks"),
            uploads_root: temp.path().join("uploads"),
        };
        let engine = Arc::new(UploadEngine::new(&config).await?);
        Ok(Self {
            _temp: temp,
            engine,
        })
    }

    /// Write a payload to a fresh staging path, as a request body would be.
    pub async fn stage(&self, contents: &[u8]) -> PathBuf {
        let path = self.engine.new_staging_path();
        tokio::fs::write(&path, contents)
            .await
            .expect("failed to stage payload");
        path
    }

    /// Stage and store one chunk, ignoring the completion check.
    pub async fn put_chunk(&self, chunk: &ChunkUpload, contents: &[u8]) {
        let staged = self.stage(contents).await;
        self.engine
            .store_chunk(chunk, &staged)
            .await
            .expect("store_chunk failed");
    }
}

/// Deterministic pseudo-random bytes for content comparisons.
#[allow(dead_code)]
pub fn seeded_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state & 0xFF) as u8
        })
        .collect()
}
