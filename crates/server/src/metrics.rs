//! Prometheus metrics for the upload API.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global metrics registry.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Chunks stored.
pub static CHUNKS_STORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("gantry_chunks_stored_total", "Total chunks stored")
        .expect("metric creation failed")
});

/// Whole files stored without chunking.
pub static FILES_STORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gantry_files_stored_total",
        "Total unchunked files stored",
    )
    .expect("metric creation failed")
});

/// Uploads assembled from chunks.
pub static UPLOADS_ASSEMBLED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gantry_uploads_assembled_total",
        "Total uploads assembled from chunks",
    )
    .expect("metric creation failed")
});

/// Uploads deleted.
pub static UPLOADS_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("gantry_uploads_deleted_total", "Total uploads deleted")
        .expect("metric creation failed")
});

/// Upload errors by kind.
pub static UPLOAD_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("gantry_upload_errors_total", "Total upload errors by type"),
        &["error_type"],
    )
    .expect("metric creation failed")
});

/// Assembly duration in seconds.
pub static ASSEMBLE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "gantry_assemble_duration_seconds",
            "Time spent assembling uploads",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(CHUNKS_STORED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FILES_STORED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOADS_ASSEMBLED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOADS_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOAD_ERRORS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ASSEMBLE_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// Helper to record upload errors by type.
pub fn record_upload_error(error_type: &str) {
    UPLOAD_ERRORS.with_label_values(&[error_type]).inc();
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}
