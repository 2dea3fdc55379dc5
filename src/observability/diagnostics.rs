//! Single diagnostics facade over the logging and instrumentation sinks.

use std::fmt::Display;
use std::sync::Arc;

use crate::instrumentation::{Instrumentation, NoopInstrumentation, SpanGuard, TraceParent};

/// Handed to each handler at construction.
#[derive(Clone)]
pub struct Diagnostics {
    instrumentation: Arc<dyn Instrumentation>,
}

impl Diagnostics {
    pub fn new(instrumentation: Arc<dyn Instrumentation>) -> Self {
        Self { instrumentation }
    }

    /// Diagnostics with instrumentation disabled.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopInstrumentation))
    }

    pub fn backend_name(&self) -> &'static str {
        self.instrumentation.name()
    }

    /// Open the span for one invocation.
    pub fn open_span(
        &self,
        name: &str,
        attributes: &[(&str, &str)],
        parent: Option<&TraceParent>,
    ) -> SpanGuard {
        SpanGuard::start(self.instrumentation.clone(), name, attributes, parent)
    }

    /// Report a fault on both sinks.
    pub fn report_fault(&self, span: &mut SpanGuard, request_id: &str, message: &str, fault: &dyn Display) {
        let description = fault.to_string();
        tracing::error!(request_id = %request_id, error = %description, "{}", message);
        span.record_fault(&description);
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("backend", &self.instrumentation.name())
            .finish()
    }
}
