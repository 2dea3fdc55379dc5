//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for both relay roles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Deployment environment name embedded in every greeting.
    pub environment_name: String,

    /// Service name reported to instrumentation backends.
    pub service_name: String,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Downstream responder the invoker calls.
    pub downstream: DownstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Greeting responder behavior.
    pub greeting: GreetingConfig,

    /// Instrumentation backends bound to the handlers.
    pub instrumentation: InstrumentationConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            environment_name: "development".to_string(),
            service_name: "lambda-relay".to_string(),
            listener: ListenerConfig::default(),
            downstream: DownstreamConfig::default(),
            timeouts: TimeoutConfig::default(),
            greeting: GreetingConfig::default(),
            instrumentation: InstrumentationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Downstream responder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Absolute URL of the greeting endpoint. Absent means the invoker
    /// answers with its own fallback payload.
    pub address: Option<String>,

    /// Bound on the single outbound call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            address: None,
            timeout_ms: 3000,
        }
    }
}

/// Timeout configuration for whole invocations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Platform deadline for one invocation in seconds.
    pub invocation_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { invocation_secs: 5 }
    }
}

/// Greeting responder configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GreetingConfig {
    /// Emit a masked internal fault on every invocation.
    pub simulate_fault: bool,
}

/// Concrete backend bound to the instrumentation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstrumentationVariant {
    /// Instrumentation disabled.
    None,
    /// Vendor-neutral tracer using OpenTelemetry semantic conventions.
    OpenStandard,
    /// Commercial APM agent.
    Vendor,
}

impl std::str::FromStr for InstrumentationVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "disabled" | "" => Ok(Self::None),
            "open-standard" | "otel" | "adot" => Ok(Self::OpenStandard),
            "vendor" | "apm" | "newrelic" => Ok(Self::Vendor),
            other => Err(format!("unknown instrumentation variant '{}'", other)),
        }
    }
}

impl std::fmt::Display for InstrumentationVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::OpenStandard => "open-standard",
            Self::Vendor => "vendor",
        };
        f.write_str(name)
    }
}

/// Instrumentation configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    /// Active backends. Empty (or only `none`) disables instrumentation.
    pub variants: Vec<InstrumentationVariant>,

    /// License key for the vendor agent.
    pub vendor_credential: Option<String>,

    /// Account identifier reported by the vendor agent.
    pub vendor_account_id: Option<String>,
}

impl InstrumentationConfig {
    /// Variants that actually bind a backend.
    pub fn active_variants(&self) -> Vec<InstrumentationVariant> {
        let mut active = Vec::new();
        for variant in &self.variants {
            if *variant != InstrumentationVariant::None && !active.contains(variant) {
                active.push(*variant);
            }
        }
        active
    }
}

/// Output format for the logging sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: RelayConfig = toml::from_str("environment_name = \"test\"").unwrap();
        assert_eq!(config.environment_name, "test");
        assert!(config.downstream.address.is_none());
        assert_eq!(config.downstream.timeout_ms, 3000);
        assert_eq!(config.timeouts.invocation_secs, 5);
        assert!(config.instrumentation.variants.is_empty());
    }

    #[test]
    fn test_variants_parse_from_toml() {
        let config: RelayConfig = toml::from_str(
            r#"
            [instrumentation]
            variants = ["open-standard", "vendor"]
            vendor_credential = "key"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.instrumentation.variants,
            vec![InstrumentationVariant::OpenStandard, InstrumentationVariant::Vendor]
        );
    }

    #[test]
    fn test_active_variants_skips_none_and_duplicates() {
        let config = InstrumentationConfig {
            variants: vec![
                InstrumentationVariant::None,
                InstrumentationVariant::Vendor,
                InstrumentationVariant::Vendor,
            ],
            ..Default::default()
        };
        assert_eq!(config.active_variants(), vec![InstrumentationVariant::Vendor]);
    }

    #[test]
    fn test_variant_from_str_aliases() {
        assert_eq!("otel".parse::<InstrumentationVariant>(), Ok(InstrumentationVariant::OpenStandard));
        assert_eq!("APM".parse::<InstrumentationVariant>(), Ok(InstrumentationVariant::Vendor));
        assert_eq!("".parse::<InstrumentationVariant>(), Ok(InstrumentationVariant::None));
        assert!("zipkin".parse::<InstrumentationVariant>().is_err());
    }
}
