//! Downstream responder (hop 2).
//!
//! Always answers `200` with a greeting. In the fault-simulation variant it
//! first raises a local error, reports it on the logging and instrumentation
//! sinks, and then answers exactly as it would have without it.

use thiserror::Error;

use crate::config::RelayConfig;
use crate::http::request::Invocation;
use crate::http::response::Envelope;
use crate::observability::Diagnostics;
use crate::relay::payload::GreetingPayload;

pub const GREETING_SPAN: &str = "greeting-lambda-handler";
pub const MASKED_FAULT_NOTE: &str = "Operation completed successfully despite internal error";

/// Internal error that is recorded but never surfaced as a failing status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Non-critical error in greeting Lambda - operation still succeeded")]
pub struct MaskedFault;

/// Greeting handler bound to one environment.
#[derive(Debug, Clone)]
pub struct GreetingHandler {
    environment: String,
    service_name: String,
    simulate_fault: bool,
    diagnostics: Diagnostics,
}

impl GreetingHandler {
    pub fn new(config: &RelayConfig, diagnostics: Diagnostics) -> Self {
        Self {
            environment: config.environment_name.clone(),
            service_name: config.service_name.clone(),
            simulate_fault: config.greeting.simulate_fault,
            diagnostics,
        }
    }

    pub fn handle(&self, invocation: &Invocation) -> Envelope {
        let mut span = self.diagnostics.open_span(
            GREETING_SPAN,
            &[
                ("lambda.environment", self.environment.as_str()),
                ("context", "greeting-lambda"),
                ("hop", "hop-2"),
                ("service.name", self.service_name.as_str()),
                ("request.id", invocation.request_id.as_str()),
            ],
            invocation.traceparent.as_ref(),
        );

        let mut payload =
            GreetingPayload::now(format!("Greetings from Lambda! Environment: {}", self.environment));

        if self.simulate_fault {
            self.diagnostics.report_fault(
                &mut span,
                &invocation.request_id,
                "Error occurred but continuing execution",
                &MaskedFault,
            );
            payload.note = Some(MASKED_FAULT_NOTE.to_string());
        }

        let envelope = Envelope::json(200, &payload);
        span.finish();
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::APPLICATION_JSON;

    fn handler(simulate_fault: bool) -> GreetingHandler {
        let mut config = RelayConfig::default();
        config.environment_name = "test".into();
        config.greeting.simulate_fault = simulate_fault;
        GreetingHandler::new(&config, Diagnostics::disabled())
    }

    #[test]
    fn test_plain_greeting() {
        let envelope = handler(false).handle(&Invocation::new("req-1"));
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.content_type(), Some(APPLICATION_JSON));

        let payload: GreetingPayload = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(payload.message, "Greetings from Lambda! Environment: test");
        assert!(payload.note.is_none());

        let keys: Vec<String> = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&envelope.body)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["message", "time"]);
    }

    #[test]
    fn test_masked_fault_still_succeeds() {
        let envelope = handler(true).handle(&Invocation::new("req-2"));
        assert_eq!(envelope.status_code, 200);

        let payload: GreetingPayload = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(payload.message, "Greetings from Lambda! Environment: test");
        assert_eq!(payload.note.as_deref(), Some(MASKED_FAULT_NOTE));
    }

    #[test]
    fn test_masked_fault_text() {
        assert_eq!(
            MaskedFault.to_string(),
            "Non-critical error in greeting Lambda - operation still succeeded"
        );
    }
}
