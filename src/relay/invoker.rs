//! Relay handler (hop 1).
//!
//! # Responsibilities
//! - Open the hop-1 span and close it on every exit path
//! - Call the downstream responder once and forward its JSON body verbatim
//! - Turn any downstream failure into a `500` with an `ErrorPayload`
//! - Answer with a fallback greeting when no downstream is configured

use std::time::Duration;

use crate::config::RelayConfig;
use crate::http::request::Invocation;
use crate::http::response::Envelope;
use crate::observability::{metrics, Diagnostics};
use crate::relay::downstream::{DownstreamClient, FetchError};
use crate::relay::payload::{ErrorPayload, GreetingPayload};

pub const INVOKER_SPAN: &str = "invoker-lambda-handler";
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching data from external API";

/// Invoker bound to one environment and, optionally, one downstream.
#[derive(Debug, Clone)]
pub struct InvokerHandler {
    environment: String,
    service_name: String,
    downstream: Option<DownstreamClient>,
    diagnostics: Diagnostics,
}

impl InvokerHandler {
    /// Fails only if the configured downstream address is not a URL.
    pub fn new(config: &RelayConfig, diagnostics: Diagnostics) -> Result<Self, FetchError> {
        let timeout = Duration::from_millis(config.downstream.timeout_ms);
        let downstream = config
            .downstream
            .address
            .as_deref()
            .map(|address| DownstreamClient::new(address, timeout))
            .transpose()?;

        Ok(Self {
            environment: config.environment_name.clone(),
            service_name: config.service_name.clone(),
            downstream,
            diagnostics,
        })
    }

    pub fn downstream(&self) -> Option<&DownstreamClient> {
        self.downstream.as_ref()
    }

    pub async fn handle(&self, invocation: &Invocation) -> Envelope {
        let mut span = self.diagnostics.open_span(
            INVOKER_SPAN,
            &[
                ("lambda.environment", self.environment.as_str()),
                ("context", "invoker-lambda"),
                ("hop", "hop-1"),
                ("service.name", self.service_name.as_str()),
                ("request.id", invocation.request_id.as_str()),
            ],
            invocation.traceparent.as_ref(),
        );

        tracing::info!(
            request_id = %invocation.request_id,
            method = %invocation.method,
            path = %invocation.path,
            "Event received"
        );

        let Some(client) = &self.downstream else {
            tracing::info!(request_id = %invocation.request_id, "No downstream configured, answering directly");
            let payload =
                GreetingPayload::now(format!("Hello from Invoker Lambda! Environment: {}", self.environment));
            let envelope = Envelope::json(200, &payload);
            span.finish();
            return envelope;
        };

        let traceparent = span.traceparent();
        let envelope = match client.fetch(&invocation.request_id, traceparent).await {
            Ok(response) => {
                metrics::record_downstream("ok");
                tracing::info!(
                    request_id = %invocation.request_id,
                    status = response.status,
                    body = %response.body,
                    "Response from external API"
                );
                Envelope::raw_json(200, response.body)
            }
            Err(e) => {
                metrics::record_downstream(e.outcome());
                self.diagnostics
                    .report_fault(&mut span, &invocation.request_id, FETCH_ERROR_MESSAGE, &e);
                Envelope::json(
                    500,
                    &ErrorPayload {
                        message: FETCH_ERROR_MESSAGE.to_string(),
                        error: e.to_string(),
                    },
                )
            }
        };

        span.finish();
        envelope
    }
}
