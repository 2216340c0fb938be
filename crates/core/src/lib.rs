//! Core domain types and shared logic for Gantry.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Upload identities and chunk/file upload records
//! - The on-disk path scheme for staged chunks and assembled files
//! - Configuration types

pub mod config;
pub mod error;
pub mod paths;
pub mod upload;

pub use config::{AppConfig, ServerConfig, StorageConfig};
pub use error::{Error, Result};
pub use upload::{ChunkUpload, FileUpload, UploadId};
