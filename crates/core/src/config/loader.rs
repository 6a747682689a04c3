use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment variables overriding the file.
pub const ENV_PREFIX: &str = "FRAMECAST_";

/// Load configuration from file with environment variable overrides
///
/// Nested keys use a double underscore: `FRAMECAST_SESSION__BROWSER_ID`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from environment variables alone, for runs without a
/// config file.
pub fn load_env_config() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
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
[ledger]
status_column = 6
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.ledger.status_column, 6);
        assert_eq!(config.ledger.prompt_column, 3);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[download]
max_attempts = "three"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/framecast.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
root_directory = "/srv/batches"

[session]
browser_id = "abc"
bridge_url = "http://127.0.0.1:9000"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.session.browser_id, "abc");
        assert_eq!(config.session.bridge_url, "http://127.0.0.1:9000");
        assert_eq!(
            config.root_directory.as_deref(),
            Some(Path::new("/srv/batches"))
        );
    }
}
