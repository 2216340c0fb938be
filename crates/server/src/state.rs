//! Application state shared across handlers.

use gantry_core::config::AppConfig;
use gantry_storage::UploadEngine;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Upload engine.
    pub engine: Arc<UploadEngine>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, engine: Arc<UploadEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
