//! Trait definitions for the media module.

use async_trait::async_trait;

use super::error::MediaError;
use super::temp::DownloadedFile;
use super::types::{DownloadRequest, MediaDescriptor, RequestOptions};

/// Something that can describe and download media from a page URL.
///
/// Both operations are cancel-safe: dropping the returned future kills the
/// underlying process and removes any partial output.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Fetches title, thumbnail and the offered format options for `url`.
    async fn fetch_metadata(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<MediaDescriptor, MediaError>;

    /// Downloads `request` into a temp file owned by the returned handle.
    async fn download(
        &self,
        request: &DownloadRequest,
        options: &RequestOptions,
    ) -> Result<DownloadedFile, MediaError>;

    /// Checks that the extractor is installed and returns its version.
    async fn validate(&self) -> Result<String, MediaError>;
}
