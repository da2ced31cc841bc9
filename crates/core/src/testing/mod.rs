//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the `MediaExtractor` trait so the HTTP
//! layer can be exercised without yt-dlp installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use waloo_core::testing::{fixtures, MockExtractor};
//!
//! let extractor = MockExtractor::new();
//!
//! // Configure mock responses
//! extractor.set_descriptor(fixtures::media_descriptor("Clip")).await;
//! extractor.set_content(b"bytes".to_vec()).await;
//!
//! // Use in AppState...
//! ```

mod mock_extractor;

pub use mock_extractor::{MockExtractor, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::media::{fixed_formats, MediaDescriptor};

    /// Create a descriptor with the fixed format list.
    pub fn media_descriptor(title: &str) -> MediaDescriptor {
        MediaDescriptor {
            title: title.to_string(),
            thumbnail: "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string(),
            duration: Some(212),
            uploader: Some("Test Channel".to_string()),
            formats: fixed_formats(),
        }
    }

    /// A yt-dlp `-j` document with a handful of formats.
    pub fn ytdlp_info_json(title: &str) -> String {
        serde_json::json!({
            "id": "dQw4w9WgXcQ",
            "title": title,
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg",
            "duration": 212.0,
            "uploader": "Test Channel",
            "formats": [
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 3_433_515},
                {"format_id": "136", "ext": "mp4", "vcodec": "avc1.4d401f", "acodec": "none", "height": 720, "filesize": 18_000_000},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080, "filesize_approx": 40_000_000}
            ]
        })
        .to_string()
    }
}
