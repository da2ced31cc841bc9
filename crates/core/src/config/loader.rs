use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from a file that must exist, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(figment_for(path))
}

/// Load configuration from an optional file, falling back to defaults when
/// the file is absent. Environment overrides still apply.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    extract(figment_for(path))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn figment_for(path: &Path) -> Figment {
    // Toml::file is a no-op for a missing file
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("WALOO_").split("__"))
        .merge(Env::raw().filter_map(|key| conventional_key(key.as_str()).map(Into::into)))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Unprefixed environment variables commonly set by hosting platforms.
fn conventional_key(key: &str) -> Option<&'static str> {
    const KEYS: &[(&str, &str)] = &[
        ("PORT", "server.port"),
        ("YTDLP_PATH", "extractor.ytdlp_path"),
        ("FFMPEG_PATH", "extractor.ffmpeg_path"),
        ("YTDLP_COOKIES", "cookies.content"),
    ];

    KEYS.iter()
        .find(|(env, _)| env.eq_ignore_ascii_case(key))
        .map(|(_, path)| *path)
}
