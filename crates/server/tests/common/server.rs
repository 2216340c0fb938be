//! Test server harness driving the router with in-process requests.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use gantry_core::config::AppConfig;
use gantry_server::{AppState, create_router};
use gantry_storage::UploadEngine;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router wired to an engine in a temp directory.
pub struct TestServer {
    temp: TempDir,
    pub router: Router,
}

impl TestServer {
    pub async fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let mut config = AppConfig::for_testing();
        config.storage.chunks_root = temp.path().join("chunks");
        config.storage.uploads_root = temp.path().join("uploads");

        let engine = UploadEngine::new(&config.storage)
            .await
            .expect("failed to create engine");
        let router = create_router(AppState::new(config, Arc::new(engine)));
        Self { temp, router }
    }

    /// Final-store path of an assembled upload.
    pub fn final_path(&self, uuid: &str, name: &str) -> std::path::PathBuf {
        self.temp.path().join("uploads").join(uuid).join(name)
    }

    /// Chunk staging directory of an upload.
    pub fn chunk_dir(&self, uuid: &str) -> std::path::PathBuf {
        self.temp.path().join("chunks").join(uuid)
    }

    /// The engine's request staging area.
    pub fn staging_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("chunks").join(".staging")
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    /// POST a multipart body to /uploads.
    pub async fn post_upload(&self, content_type: &str, body: Vec<u8>) -> Response<Body> {
        self.request(
            Request::post("/uploads")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// POST the form-encoded success callback for an upload.
    pub async fn post_done(&self, uuid: &str, form: &str) -> Response<Body> {
        self.request(
            Request::post(format!("/uploads/{uuid}/done"))
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uuid: &str) -> Response<Body> {
        self.request(
            Request::delete(format!("/uploads/{uuid}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// Read a response body as JSON.
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not JSON")
}

/// Assert a success response in the widget's wire format.
pub async fn assert_success(response: Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], Value::Bool(true));
}
