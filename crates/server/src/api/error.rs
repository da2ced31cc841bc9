//! Error responses for the HTTP API.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use waloo_core::media::tail_chars;
use waloo_core::MediaError;

pub const URL_REQUIRED_MESSAGE: &str = "URL is required";
pub const PROCESS_START_MESSAGE: &str = "Could not start yt-dlp. Server configuration error.";
pub const TIMEOUT_MESSAGE: &str = "Operation timed out";
pub const PARSE_MESSAGE: &str = "Could not read video data.";
pub const DELIVERY_MESSAGE: &str = "File send failed.";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

const STDERR_LOG_CHARS: usize = 800;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed request: status code plus the single line shown to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query string: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidInput(message) => Self::bad_request(message),
            MediaError::ProcessStart { .. } => {
                error!("{}", err);
                Self::internal(PROCESS_START_MESSAGE)
            }
            MediaError::Extraction { summary, stderr } => {
                if let Some(stderr) = stderr {
                    warn!(
                        "Extraction failed ({}); stderr tail: {}",
                        summary,
                        tail_chars(&stderr, STDERR_LOG_CHARS)
                    );
                }
                Self::internal(summary)
            }
            MediaError::Timeout { .. } => {
                warn!("{}", err);
                Self::internal(TIMEOUT_MESSAGE)
            }
            MediaError::Parse { .. } => {
                error!("{}", err);
                Self::internal(PARSE_MESSAGE)
            }
            MediaError::Delivery(_) => {
                error!("{}", err);
                Self::internal(DELIVERY_MESSAGE)
            }
            MediaError::Io(_) => {
                error!("{}", err);
                Self::internal(INTERNAL_MESSAGE)
            }
        }
    }
}
