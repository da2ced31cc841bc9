//! Media API handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::info;
use waloo_core::media::sanitize_label;
use waloo_core::{DownloadRequest, MediaDescriptor, MediaError, RequestOptions};

use super::error::{ApiError, URL_REQUIRED_MESSAGE};
use crate::metrics::DOWNLOAD_BYTES_STREAMED;
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct InfoParams {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub private: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    pub url: Option<String>,
    /// yt-dlp format selector, as returned in `formats[].format_id`.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub private: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
}

fn required_url(url: Option<&str>) -> Result<&str, ApiError> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request(URL_REQUIRED_MESSAGE))
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

fn request_options(private: Option<&str>, browser: Option<&str>) -> Result<RequestOptions, ApiError> {
    Ok(RequestOptions::from_params(is_truthy(private), browser)?)
}

/// Content type for a container extension.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "ogg" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/info
///
/// Describe the media at `url` and list the offered formats.
pub async fn info(
    State(state): State<Arc<AppState>>,
    query: Result<Query<InfoParams>, QueryRejection>,
) -> Result<Json<MediaDescriptor>, ApiError> {
    let Query(params) = query?;
    let url = required_url(params.url.as_deref())?;
    let options = request_options(params.private.as_deref(), params.browser.as_deref())?;

    let descriptor = state.extractor().fetch_metadata(url, &options).await?;
    Ok(Json(descriptor))
}

/// GET /api/download
///
/// Download `url` with the chosen format and stream the result as an
/// attachment. The temp file is deleted once the response body is dropped.
pub async fn download(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DownloadParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let url = required_url(params.url.as_deref())?;
    let options = request_options(params.private.as_deref(), params.browser.as_deref())?;

    let request = DownloadRequest::new(
        url,
        params.format.as_deref(),
        params.ext.as_deref().unwrap_or_default(),
    );
    let filename = format!(
        "{}.{}",
        sanitize_label(params.label.as_deref().unwrap_or_default()),
        request.extension()
    );

    let file = state.extractor().download(&request, &options).await?;

    let handle = tokio::fs::File::open(file.path())
        .await
        .map_err(MediaError::Delivery)?;
    let size = file.size_bytes();

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type_for_extension(request.extension())),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|_| ApiError::internal("Invalid download file name"))?,
    );

    info!("Streaming {} ({} bytes)", filename, size);

    // The closure owns the temp file guard, so the file lives exactly as
    // long as the body stream
    let stream = ReaderStream::new(handle).map(move |chunk| {
        let _guard = &file;
        if let Ok(ref bytes) = chunk {
            DOWNLOAD_BYTES_STREAMED.inc_by(bytes.len() as u64);
        }
        chunk
    });

    Ok((headers, Body::from_stream(stream)).into_response())
}
