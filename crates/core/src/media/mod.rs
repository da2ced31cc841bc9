//! Media module for describing and downloading online media.
//!
//! This module provides the `MediaExtractor` trait and a yt-dlp backed
//! implementation. Each call runs one yt-dlp process; downloads land in a
//! temp file owned by a [`DownloadedFile`] guard that deletes it on drop.
//!
//! # Features
//!
//! - Metadata lookup with a fixed or source-derived format list
//! - Downloads merged by ffmpeg into the requested container
//! - Per-site client identity (user agent, YouTube player client)
//! - Cookies from a configured file or, in private mode, a local browser
//! - Timeouts, and kill-on-drop when the caller goes away
//!
//! # Example
//!
//! ```ignore
//! use waloo_core::media::{CookieJar, DownloadRequest, MediaExtractor, RequestOptions, YtDlpExtractor};
//!
//! let extractor = YtDlpExtractor::from_config(&config, CookieJar::empty());
//!
//! let info = extractor
//!     .fetch_metadata("https://youtu.be/dQw4w9WgXcQ", &RequestOptions::default())
//!     .await?;
//! println!("{} ({} options)", info.title, info.formats.len());
//!
//! let option = &info.formats[0];
//! let request = DownloadRequest::new(
//!     "https://youtu.be/dQw4w9WgXcQ",
//!     Some(&option.format_id),
//!     &option.ext,
//! );
//! let file = extractor.download(&request, &RequestOptions::default()).await?;
//! println!("{} bytes at {:?}", file.size_bytes(), file.path());
//! // file is deleted here
//! ```

mod config;
mod cookies;
mod diagnostics;
mod error;
mod formats;
mod identity;
mod lifecycle;
mod process;
mod sanitize;
mod temp;
mod traits;
mod types;
mod ytdlp;

pub use config::{CookiesConfig, ExtractorConfig, FormatListMode, FormatsConfig};
pub use cookies::CookieJar;
pub use diagnostics::{
    summarize_stderr, tail_chars, ACCESS_RESTRICTED_MESSAGE, DOWNLOAD_FAILED_MESSAGE, ERROR_MARKER,
    METADATA_FAILED_MESSAGE,
};
pub use error::MediaError;
pub use formats::{build_format_list, derive_formats, fixed_formats};
pub use identity::{ClientIdentity, IdentityPolicy, IdentityRule};
pub use lifecycle::{DownloadLifecycle, DownloadState};
pub use sanitize::{
    sanitize_extension, sanitize_label, DEFAULT_EXTENSION, DEFAULT_LABEL, MAX_EXTENSION_LEN,
    MAX_LABEL_LEN,
};
pub use temp::{sweep_stale_files, DownloadedFile, PendingOutput, TEMP_FILE_PREFIX};
pub use traits::MediaExtractor;
pub use types::{
    Browser, DownloadRequest, ExtractorFormat, ExtractorInfo, FormatOption, MediaDescriptor,
    MediaKind, RequestOptions,
};
pub use ytdlp::YtDlpExtractor;
