//! Startup configuration resolution.
//!
//! Order: optional TOML file, then values injected by the deployment
//! descriptor, then validation. The result is the only configuration the
//! handlers ever see.

use std::path::Path;

use crate::config::{apply_env_overrides, read_config, validate_config, ConfigError, RelayConfig};

/// Resolve the configuration for this process.
pub fn resolve_config<I, K, V>(path: Option<&Path>, vars: I) -> Result<RelayConfig, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => RelayConfig::default(),
    };
    apply_env_overrides(&mut config, vars)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;

    #[test]
    fn test_defaults_plus_overrides() {
        let config = resolve_config(
            None,
            [("ENVIRONMENT", "test"), ("GREETING_API_ENDPOINT", "http://127.0.0.1:3000/")],
        )
        .unwrap();
        assert_eq!(config.environment_name, "test");
        assert_eq!(config.downstream.address.as_deref(), Some("http://127.0.0.1:3000/"));
    }

    #[test]
    fn test_overrides_are_validated() {
        let err = resolve_config(None, [("RELAY_INSTRUMENTATION", "vendor")]).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::MissingVendorCredential]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_values_are_validated_after_overrides() {
        let path = std::env::temp_dir().join(format!("relay-startup-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "environment_name = \"staging\"\n[downstream]\ntimeout_ms = 0\n").unwrap();

        let err = resolve_config(Some(&path), Vec::<(String, String)>::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("downstream.timeout_ms"));

        let config = resolve_config(Some(&path), [("RELAY_DOWNSTREAM_TIMEOUT_MS", "750")]).unwrap();
        assert_eq!(config.environment_name, "staging");
        assert_eq!(config.downstream.timeout_ms, 750);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = resolve_config(Some(Path::new("/nonexistent/relay.toml")), Vec::<(String, String)>::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
