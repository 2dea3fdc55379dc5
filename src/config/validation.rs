//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges, addresses, and
//! cross-field constraints. Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{InstrumentationVariant, RelayConfig};

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}': not a socket address")]
    InvalidSocketAddress { field: &'static str, value: String },

    #[error("invalid downstream address '{value}': {reason}")]
    InvalidDownstreamAddress { value: String, reason: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("downstream timeout {downstream_ms}ms must be below the invocation deadline {invocation_ms}ms")]
    TimeoutOrdering { downstream_ms: u64, invocation_ms: u64 },

    #[error("instrumentation variant 'vendor' requires a vendor credential")]
    MissingVendorCredential,

    #[error("environment_name must not be empty")]
    EmptyEnvironment,
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.environment_name.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvironment);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Some(address) = &config.downstream.address {
        if let Err(reason) = check_downstream_url(address) {
            errors.push(ValidationError::InvalidDownstreamAddress {
                value: address.clone(),
                reason,
            });
        }
    }

    if config.downstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "downstream.timeout_ms" });
    }
    if config.timeouts.invocation_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.invocation_secs" });
    }

    let invocation_ms = config.timeouts.invocation_secs.saturating_mul(1000);
    if config.downstream.timeout_ms > 0
        && invocation_ms > 0
        && config.downstream.timeout_ms >= invocation_ms
    {
        errors.push(ValidationError::TimeoutOrdering {
            downstream_ms: config.downstream.timeout_ms,
            invocation_ms,
        });
    }

    let wants_vendor = config
        .instrumentation
        .active_variants()
        .contains(&InstrumentationVariant::Vendor);
    let has_credential = config
        .instrumentation
        .vendor_credential
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    if wants_vendor && !has_credential {
        errors.push(ValidationError::MissingVendorCredential);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_downstream_url(address: &str) -> Result<(), String> {
    let url = Url::parse(address).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}
