//! Types for the media module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::MediaError;
use super::sanitize::sanitize_extension;

/// Kind of media a format option produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// A downloadable variant offered to the user.
///
/// `format_id` is the selector handed to yt-dlp verbatim; `label` and `ext`
/// describe what that selector produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOption {
    pub format_id: String,
    pub label: String,
    pub ext: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FormatOption {
    pub fn video(format_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            format_id: format_id.into(),
            label: label.into(),
            ext: "mp4".to_string(),
            kind: MediaKind::Video,
            note: None,
        }
    }

    pub fn audio(format_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            format_id: format_id.into(),
            label: label.into(),
            ext: "m4a".to_string(),
            kind: MediaKind::Audio,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

/// Metadata describing a single media resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub title: String,
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    pub formats: Vec<FormatOption>,
}

/// A download job: what to fetch and which container to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    format_selector: String,
    extension: String,
}

impl DownloadRequest {
    /// Default selector used when the caller does not pick one.
    pub const DEFAULT_SELECTOR: &'static str = "best";

    /// Creates a request. The extension is sanitized here so no caller can
    /// smuggle path components into the output file name.
    pub fn new(url: impl Into<String>, format_selector: Option<&str>, extension: &str) -> Self {
        let format_selector = format_selector
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(Self::DEFAULT_SELECTOR)
            .to_string();

        Self {
            url: url.into(),
            format_selector,
            extension: sanitize_extension(extension),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format_selector(&self) -> &str {
        &self.format_selector
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Browser yt-dlp can read cookies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Brave,
    Chrome,
    Chromium,
    Edge,
    Firefox,
    Opera,
    Safari,
    Vivaldi,
}

impl Browser {
    pub const ALL: [Browser; 8] = [
        Browser::Brave,
        Browser::Chrome,
        Browser::Chromium,
        Browser::Edge,
        Browser::Firefox,
        Browser::Opera,
        Browser::Safari,
        Browser::Vivaldi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Brave => "brave",
            Browser::Chrome => "chrome",
            Browser::Chromium => "chromium",
            Browser::Edge => "edge",
            Browser::Firefox => "firefox",
            Browser::Opera => "opera",
            Browser::Safari => "safari",
            Browser::Vivaldi => "vivaldi",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Browser::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MediaError::invalid_input(format!("Unsupported browser: {}", wanted)))
    }
}

/// Per-request knobs supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Private mode: read cookies from this browser's profile.
    pub cookies_from_browser: Option<Browser>,
}

impl RequestOptions {
    /// Builds options from the raw `private` / `browser` request parameters.
    pub fn from_params(private: bool, browser: Option<&str>) -> Result<Self, MediaError> {
        let browser = browser.map(str::trim).filter(|b| !b.is_empty());
        match (private, browser) {
            (false, _) => Ok(Self::default()),
            (true, None) => Err(MediaError::invalid_input(
                "Private mode requires a browser to read cookies from",
            )),
            (true, Some(name)) => Ok(Self {
                cookies_from_browser: Some(name.parse()?),
            }),
        }
    }
}

/// The subset of yt-dlp's `-j` output this service reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub formats: Vec<ExtractorFormat>,
}

/// One entry of yt-dlp's `formats` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

impl ExtractorFormat {
    pub fn has_video(&self) -> bool {
        matches!(self.vcodec.as_deref(), Some(codec) if codec != "none")
    }

    pub fn has_audio(&self) -> bool {
        matches!(self.acodec.as_deref(), Some(codec) if codec != "none")
    }

    pub fn is_audio_only(&self) -> bool {
        !self.has_video() && self.has_audio()
    }

    /// Reported or estimated size in bytes.
    pub fn size_bytes(&self) -> Option<f64> {
        self.filesize.or(self.filesize_approx).filter(|s| *s > 0.0)
    }
}

impl ExtractorInfo {
    /// Builds the descriptor returned to clients.
    pub fn into_descriptor(self, formats: Vec<FormatOption>) -> MediaDescriptor {
        let uploader = self
            .uploader
            .filter(|u| !u.trim().is_empty())
            .or(self.channel.filter(|c| !c.trim().is_empty()));

        MediaDescriptor {
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            thumbnail: self.thumbnail.unwrap_or_default(),
            duration: self
                .duration
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(|d| d.round() as u64),
            uploader,
            formats,
        }
    }
}
