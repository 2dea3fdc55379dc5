//! Commercial APM agent backend.
//!
//! Each span becomes an agent "transaction". On close the agent emits one
//! transaction record (JSON on the `apm` log target) and updates the
//! `apm_transactions_total` / `apm_transaction_duration_seconds` metrics.
//! The license key is held for the exporter and never written to logs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::instrumentation::{Instrumentation, SpanContext, SpanHandle};

/// APM agent bound with a license key.
#[derive(Clone)]
pub struct VendorAgent {
    license_key: String,
    account_id: Option<String>,
    app_name: String,
}

#[derive(Default)]
struct Transaction {
    errors: Vec<String>,
}

/// Record emitted for every finished transaction.
#[derive(Debug, Serialize)]
pub struct TransactionEvent<'a> {
    pub name: &'a str,
    pub app_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<&'a str>,
    pub guid: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub duration_ms: f64,
    pub error: bool,
    pub errors: Vec<String>,
    pub attributes: BTreeMap<&'a str, &'a str>,
}

impl VendorAgent {
    pub fn new(license_key: impl Into<String>, account_id: Option<String>, app_name: &str) -> Self {
        let license_key = license_key.into();
        if license_key.trim().is_empty() {
            tracing::warn!(target: "apm", "APM agent created without a license key; data will be rejected upstream");
        }
        Self {
            license_key,
            account_id,
            app_name: app_name.to_string(),
        }
    }

    /// Masked license key safe for logs.
    pub fn license_key_hint(&self) -> String {
        let visible: String = self
            .license_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if self.license_key.chars().count() <= 4 {
            "****".to_string()
        } else {
            format!("****{}", visible)
        }
    }

    fn event<'a>(&'a self, span: &'a SpanHandle, transaction: &Transaction) -> TransactionEvent<'a> {
        let context = span.context();
        TransactionEvent {
            name: span.name(),
            app_name: &self.app_name,
            account_id: self.account_id.as_deref(),
            guid: context.span_id_hex(),
            trace_id: context.trace_id_hex(),
            parent_id: context.parent_span_id_hex(),
            duration_ms: span.elapsed().as_secs_f64() * 1000.0,
            error: !transaction.errors.is_empty(),
            errors: transaction.errors.clone(),
            attributes: span
                .attributes()
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        }
    }
}

impl std::fmt::Debug for VendorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorAgent")
            .field("license_key", &self.license_key_hint())
            .field("account_id", &self.account_id)
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl Instrumentation for VendorAgent {
    fn name(&self) -> &'static str {
        "vendor"
    }

    fn start_span_with_context(
        &self,
        name: &str,
        attributes: &[(&str, &str)],
        context: SpanContext,
    ) -> SpanHandle {
        let mut handle = SpanHandle::new(name, attributes, context);
        handle.set_extension(Transaction::default());
        tracing::trace!(target: "apm", transaction = %name, "transaction started");
        handle
    }

    fn record_fault(&self, span: &mut SpanHandle, fault: &str) {
        let name = span.name().to_string();
        if let Some(transaction) = span.extension_mut::<Transaction>() {
            transaction.errors.push(fault.to_string());
            tracing::debug!(target: "apm", transaction = %name, error = %fault, "transaction error noticed");
        }
    }

    fn end_span(&self, mut span: SpanHandle) {
        let Some(transaction) = span.take_extension::<Transaction>() else {
            return;
        };
        let event = self.event(&span, &transaction);
        let outcome = if event.error { "error" } else { "ok" };

        metrics::counter!(
            "apm_transactions_total",
            "name" => event.name.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("apm_transaction_duration_seconds", "name" => event.name.to_string())
            .record(event.duration_ms / 1000.0);

        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(target: "apm", %payload, "transaction"),
            Err(e) => tracing::warn!(target: "apm", error = %e, "failed to encode transaction"),
        }
    }
}
