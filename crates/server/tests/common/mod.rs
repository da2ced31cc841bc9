//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock extractor injected, enabling API testing without yt-dlp.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use waloo_core::testing::MockExtractor;
use waloo_core::MediaExtractor;

/// Re-export fixtures for test convenience
pub use waloo_core::testing::fixtures;

/// Test fixture for API testing with a mock extractor.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_info() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.get("/api/info?url=https://example.com/v").await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock extractor - configure descriptors, content and failures
    pub extractor: Arc<MockExtractor>,
    /// Directory the mock extractor writes downloads into
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    /// Body parsed as JSON, `Value::Null` when it is not JSON
    pub body: Value,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let extractor =
            Arc::new(MockExtractor::new().with_temp_dir(temp_dir.path().to_path_buf()));

        let state = Arc::new(waloo_server::state::AppState::new(
            Arc::clone(&extractor) as Arc<dyn MediaExtractor>,
        ));

        // Create router
        let router = waloo_server::api::create_router(state);

        Self {
            router,
            extractor,
            temp_dir,
        }
    }

    /// Files currently in the download directory.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_dir.path())
            .map(|entries| entries.flatten().map(|e| e.path()).collect())
            .unwrap_or_default()
    }

    /// Send a GET request and collect the whole body.
    pub async fn get(&self, path: &str) -> TestResponse {
        let response = self.send(Request::get(path).body(Body::empty()).unwrap()).await;
        collect(response).await
    }

    /// Send a GET request without reading the body.
    pub async fn get_streaming(&self, path: &str) -> Response {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send an arbitrary request and collect the whole body.
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        collect(self.send(request).await).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }
}

async fn collect(response: Response) -> TestResponse {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes()
        .to_vec();

    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        bytes,
        body,
    }
}
