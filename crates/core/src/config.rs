//! Configuration types shared across crates.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_size() -> usize {
    256 * 1024 * 1024
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_size: default_max_upload_size(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for staged chunks.
    #[serde(default = "default_chunks_root")]
    pub chunks_root: PathBuf,
    /// Root directory for assembled uploads.
    #[serde(default = "default_uploads_root")]
    pub uploads_root: PathBuf,
}

fn default_chunks_root() -> PathBuf {
    PathBuf::from("./data/chunks")
}

fn default_uploads_root() -> PathBuf {
    PathBuf::from("./data/uploads")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            chunks_root: default_chunks_root(),
            uploads_root: default_uploads_root(),
        }
    }
}

impl StorageConfig {
    /// Validate the configuration. The two roots must be distinct directories;
    /// chunk staging subtrees are reclaimed wholesale after assembly.
    pub fn validate(&self) -> Result<()> {
        if self.chunks_root == self.uploads_root {
            return Err(Error::Config(format!(
                "chunks_root and uploads_root must differ (both are {})",
                self.chunks_root.display()
            )));
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Configuration suitable for tests: defaults with storage roots left for
    /// the caller to point at a temp directory.
    pub fn for_testing() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.server.metrics_enabled);
        assert!(config.storage.validate().is_ok());
    }

    #[test]
    fn empty_toml_deserializes_to_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.max_upload_size, 256 * 1024 * 1024);
    }

    #[test]
    fn identical_roots_rejected() {
        let config = StorageConfig {
            chunks_root: PathBuf::from("/data/x"),
            uploads_root: PathBuf::from("/data/x"),
        };
        assert!(config.validate().is_err());
    }
}
