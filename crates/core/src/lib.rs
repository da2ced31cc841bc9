pub mod config;
pub mod media;
pub mod metrics;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use media::{
    CookieJar, DownloadRequest, DownloadedFile, FormatOption, MediaDescriptor, MediaError,
    MediaExtractor, RequestOptions, YtDlpExtractor,
};
