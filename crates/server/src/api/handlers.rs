use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Json};
use serde::Serialize;

use crate::metrics::encode_metrics;

/// Text returned by the liveness probe.
pub const LIVENESS_TEXT: &str = "WALOO Media Server is running";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn root() -> &'static str {
    LIVENESS_TEXT
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        encode_metrics(),
    )
}
