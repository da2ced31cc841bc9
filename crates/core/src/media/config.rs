//! Configuration for the media module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the yt-dlp based extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to (or command name of) the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Path to the ffmpeg binary yt-dlp uses for merging streams.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Directory for in-flight download files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Pass `--no-check-certificate` (works around TLS issues on some hosts).
    #[serde(default = "default_true")]
    pub no_check_certificate: bool,

    /// Timeout for a metadata lookup in seconds.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// Timeout for a download in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Additional arguments passed to every yt-dlp invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ytdlp_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("bin").join("yt-dlp.exe")
    } else {
        PathBuf::from("yt-dlp")
    }
}

fn default_ffmpeg_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("bin").join("ffmpeg.exe")
    } else {
        PathBuf::from("ffmpeg")
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_true() -> bool {
    true
}

fn default_metadata_timeout() -> u64 {
    60
}

fn default_download_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            ffmpeg_path: default_ffmpeg_path(),
            temp_dir: default_temp_dir(),
            no_check_certificate: true,
            metadata_timeout_secs: default_metadata_timeout(),
            download_timeout_secs: default_download_timeout(),
            extra_args: Vec::new(),
        }
    }
}

impl ExtractorConfig {
    /// Creates a config with custom binary paths.
    pub fn with_paths(ytdlp_path: PathBuf, ffmpeg_path: PathBuf) -> Self {
        Self {
            ytdlp_path,
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the temp directory.
    pub fn with_temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// Sets both timeouts in seconds.
    pub fn with_timeouts(mut self, metadata_secs: u64, download_secs: u64) -> Self {
        self.metadata_timeout_secs = metadata_secs;
        self.download_timeout_secs = download_secs;
        self
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// How the list of offered formats is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatListMode {
    /// The four hand-curated options, regardless of what the source offers.
    #[default]
    Fixed,
    /// One option per target height actually present in the source.
    Derived,
}

/// Format list configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatsConfig {
    #[serde(default)]
    pub mode: FormatListMode,

    /// Heights scanned for in derived mode, in the order they are offered.
    #[serde(default = "default_target_heights")]
    pub target_heights: Vec<u32>,
}

fn default_target_heights() -> Vec<u32> {
    vec![2160, 1440, 1080, 720, 480, 360]
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            mode: FormatListMode::Fixed,
            target_heights: default_target_heights(),
        }
    }
}

/// Cookie source configuration.
///
/// `content` holds a whole Netscape cookie file (typically injected through
/// the `YTDLP_COOKIES` environment variable) and takes precedence over
/// `file`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CookiesConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing)]
    pub content: Option<String>,
}

impl CookiesConfig {
    /// Cookie content, if present and not blank.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

impl fmt::Debug for CookiesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookiesConfig")
            .field("file", &self.file)
            .field(
                "content",
                &self.content().map(|c| format!("<{} bytes>", c.len())),
            )
            .finish()
    }
}
