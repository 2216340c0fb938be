//! Chunk storage and assembly engine for Gantry.
//!
//! This crate provides:
//! - Atomic chunk placement from a staging file into the per-upload directory
//! - Count-based completeness and exact-size verification
//! - Deterministic stream assembly of staged chunks into one output file
//! - The upload lifecycle controller with per-identity assembly exclusion

pub mod assemble;
pub mod engine;
pub mod error;
pub mod store;
pub mod verify;

pub use engine::{ChunkOutcome, UploadEngine};
pub use error::{EngineError, EngineResult};
