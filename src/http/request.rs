//! Inbound invocation extraction.
//!
//! The relay does not validate or transform the inbound request; it only pulls
//! out what it logs (request id, method, path) and the optional trace context.

use axum::http::{HeaderMap, Method, Uri};

use crate::instrumentation::{TraceParent, TRACEPARENT};

/// Header used for request correlation.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The opaque inbound trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub traceparent: Option<TraceParent>,
}

impl Invocation {
    /// A bare `GET /` invocation, for driving handlers directly.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            method: Method::GET.to_string(),
            path: "/".to_string(),
            traceparent: None,
        }
    }

    /// Continue the given trace.
    pub fn with_traceparent(mut self, traceparent: TraceParent) -> Self {
        self.traceparent = Some(traceparent);
        self
    }

    /// Build from the parts of an HTTP request.
    ///
    /// A missing request id becomes `"unknown"`; an unparseable `traceparent`
    /// is ignored and the handler starts a new trace.
    pub fn from_http(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let traceparent = headers
            .get(TRACEPARENT)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| match v.parse::<TraceParent>() {
                Ok(tp) => Some(tp),
                Err(e) => {
                    tracing::debug!(request_id = %request_id, error = %e, "Ignoring invalid traceparent");
                    None
                }
            });

        Self {
            request_id,
            method: method.to_string(),
            path: uri.path().to_string(),
            traceparent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extracts_request_id_and_trace() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-1"));
        headers.insert(
            TRACEPARENT,
            HeaderValue::from_static("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
        );
        let uri: Uri = "/?name=world".parse().unwrap();

        let invocation = Invocation::from_http(&Method::GET, &uri, &headers);
        assert_eq!(invocation.request_id, "req-1");
        assert_eq!(invocation.path, "/");
        assert_eq!(invocation.method, "GET");
        assert_eq!(invocation.traceparent.unwrap().parent_id, 0x00f067aa0ba902b7);
    }

    #[test]
    fn test_tolerates_missing_and_invalid_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_static("not-a-traceparent"));
        let uri: Uri = "/".parse().unwrap();

        let invocation = Invocation::from_http(&Method::GET, &uri, &headers);
        assert_eq!(invocation.request_id, "unknown");
        assert!(invocation.traceparent.is_none());
    }
}
