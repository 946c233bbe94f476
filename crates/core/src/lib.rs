pub mod auth;
pub mod cache;
pub mod config;
pub mod extractor;
pub mod resolver;
pub mod testing;

pub use auth::{generate_key, AuthError, KeyRegistry};
pub use cache::{start_sweeper, ResultCache};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, CacheConfig, Config,
    ConfigError, KeepAliveConfig, SanitizedConfig, ServerConfig,
};
pub use extractor::{
    Extraction, ExtractorConfig, ExtractorError, Extractor, MediaMetadata, OperationKind,
    YtDlpExtractor,
};
pub use resolver::{fingerprint, MediaResolver, ResolveError, ResolvedMedia, Resolution};
