use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Every field has a default, so a missing file is not an error; the service
/// can be configured entirely through `YTLINK_`-prefixed environment
/// variables (section and field separated by a double underscore, e.g.
/// `YTLINK_SERVER__PORT=3000`, `YTLINK_AUTH__MASTER_KEY=...`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(Env::prefixed("YTLINK_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[cache]
ttl_secs = 120
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cache.ttl_secs, 120);
    }

    #[test]
    fn test_load_config_from_str_invalid_toml() {
        let result = load_config_from_str("[server\nport = 1");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.ttl_secs, 300);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[auth]
master_key = "test-master"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.auth.master_key.as_deref(), Some("test-master"));
    }
}
