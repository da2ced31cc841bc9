//! Mock extractor for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::media::{
    DownloadRequest, DownloadedFile, MediaDescriptor, MediaError, MediaExtractor,
    PendingOutput, RequestOptions,
};

/// A recorded extractor call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Metadata {
        url: String,
        options: RequestOptions,
    },
    Download {
        request: DownloadRequest,
        options: RequestOptions,
    },
}

/// Mock implementation of the MediaExtractor trait.
///
/// Provides controllable behavior for testing:
/// - Track calls for assertions
/// - Simulate failures with any `MediaError`
/// - Control the returned descriptor and downloaded bytes
/// - Simulate slow downloads
///
/// Downloads write a real file into the configured directory, so callers can
/// assert that it is gone once the returned handle is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use waloo_core::testing::MockExtractor;
///
/// let extractor = MockExtractor::new().with_temp_dir(dir.path().to_path_buf());
/// extractor.set_content(b"video bytes".to_vec()).await;
///
/// let file = extractor.download(&request, &RequestOptions::default()).await?;
/// assert_eq!(extractor.download_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockExtractor {
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    descriptor: Arc<RwLock<MediaDescriptor>>,
    content: Arc<RwLock<Vec<u8>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<MediaError>>>,
    download_delay: Arc<RwLock<Duration>>,
    temp_dir: PathBuf,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Create a new mock extractor writing into the system temp dir.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            descriptor: Arc::new(RwLock::new(super::fixtures::media_descriptor("Test Video"))),
            content: Arc::new(RwLock::new(b"mock media content".to_vec())),
            next_error: Arc::new(RwLock::new(None)),
            download_delay: Arc::new(RwLock::new(Duration::ZERO)),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Use `dir` for downloaded files.
    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = dir;
        self
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn download_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedCall::Download { .. }))
            .count()
    }

    /// Set the descriptor returned by `fetch_metadata`.
    pub async fn set_descriptor(&self, descriptor: MediaDescriptor) {
        *self.descriptor.write().await = descriptor;
    }

    /// Set the bytes written by `download`.
    pub async fn set_content(&self, content: Vec<u8>) {
        *self.content.write().await = content;
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: MediaError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make `download` wait before producing its file.
    pub async fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.write().await = delay;
    }

    async fn take_error(&self) -> Option<MediaError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl MediaExtractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_metadata(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<MediaDescriptor, MediaError> {
        self.calls.write().await.push(RecordedCall::Metadata {
            url: url.to_string(),
            options: options.clone(),
        });

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Ok(self.descriptor.read().await.clone())
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        options: &RequestOptions,
    ) -> Result<DownloadedFile, MediaError> {
        self.calls.write().await.push(RecordedCall::Download {
            request: request.clone(),
            options: options.clone(),
        });

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let pending = PendingOutput::new(&self.temp_dir, request.extension());
        let content = self.content.read().await.clone();
        tokio::fs::write(pending.path(), &content).await?;

        // Dropping the future here removes the file via the pending guard
        let delay = *self.download_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(pending.finish(content.len() as u64))
    }

    async fn validate(&self) -> Result<String, MediaError> {
        Ok("mock".to_string())
    }
}
