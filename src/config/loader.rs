//! Configuration loading from disk and from deployment-injected values.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{InstrumentationVariant, RelayConfig};
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    Override { key: String, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a configuration file without validating it.
pub fn read_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&content)?;
    Ok(config)
}


/// Apply values injected by the deployment descriptor.
///
/// Takes the pairs explicitly so callers decide where they come from; only the
/// binary entry point hands in the process environment. Unknown keys are ignored.
pub fn apply_env_overrides<I, K, V>(config: &mut RelayConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    for (key, value) in vars {
        let key = key.as_ref();
        let value: String = value.into();
        match key {
            "ENVIRONMENT" => config.environment_name = value,
            "SERVICE_NAME" | "OTEL_SERVICE_NAME" => config.service_name = value,
            "GREETING_API_ENDPOINT" => {
                config.downstream.address = if value.trim().is_empty() { None } else { Some(value) };
            }
            "RELAY_DOWNSTREAM_TIMEOUT_MS" => {
                config.downstream.timeout_ms = parse_number(key, &value)?;
            }
            "RELAY_INVOCATION_TIMEOUT_SECS" => {
                config.timeouts.invocation_secs = parse_number(key, &value)?;
            }
            "RELAY_BIND_ADDRESS" => config.listener.bind_address = value,
            "RELAY_SIMULATE_FAULT" => {
                config.greeting.simulate_fault = parse_flag(key, &value)?;
            }
            "RELAY_INSTRUMENTATION" => {
                config.instrumentation.variants = value
                    .split(',')
                    .map(str::parse::<InstrumentationVariant>)
                    .collect::<Result<_, _>>()
                    .map_err(|reason| ConfigError::Override { key: key.to_string(), reason })?;
            }
            "NEW_RELIC_LICENSE_KEY" => config.instrumentation.vendor_credential = Some(value),
            "NEW_RELIC_ACCOUNT_ID" => config.instrumentation.vendor_account_id = Some(value),
            "RELAY_LOG_LEVEL" => config.observability.log_level = value,
            _ => {}
        }
    }
    Ok(())
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Override {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Override {
            key: key.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
