//! Response envelope shared by both handlers.
//!
//! `{statusCode, body, headers}` where `body` is always a JSON-encoded string
//! and `headers["Content-Type"]` is always `application/json`.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Handler result, independent of the transport that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl Envelope {
    /// Serialize `payload` as the body.
    pub fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self::raw_json(status_code, body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode response payload");
                Self::raw_json(
                    500,
                    r#"{"message":"Failed to encode response","error":"serialization failed"}"#.to_string(),
                )
            }
        }
    }

    /// Use an already-encoded JSON document as the body, unchanged.
    pub fn raw_json(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        Self {
            status_code,
            body,
            headers,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }
        headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(APPLICATION_JSON));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_envelope_shape() {
        let envelope = Envelope::json(200, &json!({"message": "hi"}));
        assert_eq!(envelope.content_type(), Some(APPLICATION_JSON));
        assert_eq!(envelope.body, r#"{"message":"hi"}"#);

        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(encoded["statusCode"], 200);
        assert!(encoded["body"].is_string());
        assert_eq!(encoded["headers"]["Content-Type"], APPLICATION_JSON);
    }

    #[test]
    fn test_into_response_carries_status_and_header() {
        let response = Envelope::raw_json(500, "{}".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
    }

    #[test]
    fn test_unknown_status_maps_to_500() {
        let response = Envelope::raw_json(42, "{}".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
