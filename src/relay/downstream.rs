//! Outbound client for the downstream responder.
//!
//! # Responsibilities
//! - Issue exactly one GET to the configured address
//! - Bound the whole exchange (connect, headers, body) by the configured timeout
//! - Accept the body only if it parses as JSON; hand it back byte-for-byte
//!
//! # Design Decisions
//! - No retries: a failure is reported once and the invocation answers 500
//! - Uses Tokio's timeout around the full exchange, so a slow body counts too

use std::time::Duration;

use reqwest::header::ACCEPT;
use thiserror::Error;
use url::Url;

use crate::http::request::X_REQUEST_ID;
use crate::instrumentation::{TraceParent, TRACEPARENT};

/// Why the downstream call did not produce a usable body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid downstream address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("fetch failed: {0}")]
    Transport(String),

    #[error("downstream did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("invalid JSON in downstream response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            FetchError::InvalidAddress { .. } => "invalid_address",
            FetchError::Transport(_) => "transport_error",
            FetchError::Timeout(_) => "timeout",
            FetchError::Malformed(_) => "malformed",
        }
    }
}

/// Validated downstream body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamResponse {
    pub status: u16,
    pub body: String,
}

/// Client bound to one downstream address.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl DownstreamClient {
    pub fn new(address: &str, timeout: Duration) -> Result<Self, FetchError> {
        let url = Url::parse(address).map_err(|e| FetchError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| FetchError::Transport(error_chain(&e)))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform the single outbound GET.
    pub async fn fetch(
        &self,
        request_id: &str,
        traceparent: Option<TraceParent>,
    ) -> Result<DownstreamResponse, FetchError> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .header(X_REQUEST_ID, request_id);
        if let Some(traceparent) = traceparent {
            request = request.header(TRACEPARENT, traceparent.to_string());
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return Err(FetchError::Transport(error_chain(&e))),
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };

        if !status.is_success() {
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                "Downstream answered with a non-success status"
            );
        }

        let body = strip_bom(&body);
        serde_json::from_slice::<serde::de::IgnoredAny>(body)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        let body = String::from_utf8(body.to_vec()).map_err(|e| FetchError::Malformed(e.to_string()))?;

        Ok(DownstreamResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Drop a leading UTF-8 byte order mark, as JSON decoders on the web platform do.
fn strip_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(body)
}

/// Flatten an error and its sources into one line.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_relative_address() {
        let err = DownstreamClient::new("/greeting", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, FetchError::InvalidAddress { .. }));
        assert_eq!(err.outcome(), "invalid_address");
    }

    #[test]
    fn test_timeout_message_names_budget() {
        let err = FetchError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "downstream did not respond within 250ms");
    }

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{feff}{\"a\":1}".as_bytes()), br#"{"a":1}"#);
        assert_eq!(strip_bom(br#"{"a":1}"#), br#"{"a":1}"#);
        assert_eq!(strip_bom(b""), b"");
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let outer = FetchError::Transport(error_chain(&inner));
        assert_eq!(outer.to_string(), "fetch failed: connection refused");
    }
}
