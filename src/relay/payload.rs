//! JSON payloads carried in envelope bodies.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Successful greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingPayload {
    pub message: String,
    pub time: String,
    /// Present only when a masked fault occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl GreetingPayload {
    /// Payload stamped with the current time.
    pub fn now(message: String) -> Self {
        Self {
            message,
            time: timestamp(),
            note: None,
        }
    }
}

/// Body of a 500 from the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    pub error: String,
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
