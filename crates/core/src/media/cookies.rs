//! Cookie file handed to yt-dlp via `--cookies`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::config::CookiesConfig;
use super::error::MediaError;
use super::temp::TEMP_FILE_PREFIX;

/// The cookie file available to the extractor, if any.
///
/// Inline content is written once to a temp file that lives as long as the
/// jar. A configured file path is used as-is.
#[derive(Debug, Default)]
pub struct CookieJar {
    path: Option<PathBuf>,
    _materialized: Option<NamedTempFile>,
}

impl CookieJar {
    /// A jar without cookies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolves the configured cookie source.
    pub fn from_config(config: &CookiesConfig, temp_dir: &Path) -> Result<Self, MediaError> {
        if let Some(content) = config.content() {
            let mut file = tempfile::Builder::new()
                .prefix(&format!("{}cookies_", TEMP_FILE_PREFIX))
                .suffix(".txt")
                .tempfile_in(temp_dir)?;
            file.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                file.write_all(b"\n")?;
            }
            file.flush()?;

            info!(
                "Wrote {} bytes of cookie content to {:?}",
                content.len(),
                file.path()
            );
            return Ok(Self {
                path: Some(file.path().to_path_buf()),
                _materialized: Some(file),
            });
        }

        if let Some(ref path) = config.file {
            if !path.exists() {
                warn!("Configured cookie file {:?} does not exist", path);
            }
            return Ok(Self {
                path: Some(path.clone()),
                _materialized: None,
            });
        }

        Ok(Self::empty())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.path.is_some()
    }
}
