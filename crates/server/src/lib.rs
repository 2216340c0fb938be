//! HTTP upload API for Gantry.
//!
//! This crate provides the HTTP surface over the upload engine:
//! - Multipart chunk and whole-file intake
//! - The upload success callback with size verification
//! - Upload deletion
//! - Health and Prometheus metrics endpoints

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
