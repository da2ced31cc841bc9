use super::{types::Config, ConfigError};
use crate::media::FormatListMode;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Extractor binaries are set and timeouts are non-zero
/// - Derived format lists have at least one non-zero target height
/// - Identity rules name at least one domain and carry no blank overrides
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Extractor validation
    let extractor = &config.extractor;
    if extractor.ytdlp_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.ytdlp_path cannot be empty".to_string(),
        ));
    }
    if extractor.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.ffmpeg_path cannot be empty".to_string(),
        ));
    }
    if extractor.metadata_timeout_secs == 0 || extractor.download_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "extractor timeouts must be greater than 0".to_string(),
        ));
    }

    // Format list validation
    if config.formats.mode == FormatListMode::Derived {
        if config.formats.target_heights.is_empty() {
            return Err(ConfigError::ValidationError(
                "formats.target_heights cannot be empty in derived mode".to_string(),
            ));
        }
        if config.formats.target_heights.contains(&0) {
            return Err(ConfigError::ValidationError(
                "formats.target_heights cannot contain 0".to_string(),
            ));
        }
    }

    // Identity validation
    config
        .identity
        .validate()
        .map_err(ConfigError::ValidationError)?;

    Ok(())
}
