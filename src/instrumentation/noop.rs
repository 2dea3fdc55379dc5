//! Disabled instrumentation.

use crate::instrumentation::{Instrumentation, SpanContext, SpanHandle};

/// Backend bound when no instrumentation variant is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumentation;

impl Instrumentation for NoopInstrumentation {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn start_span_with_context(
        &self,
        name: &str,
        attributes: &[(&str, &str)],
        context: SpanContext,
    ) -> SpanHandle {
        SpanHandle::new(name, attributes, context)
    }

    fn record_fault(&self, _span: &mut SpanHandle, _fault: &str) {}

    fn end_span(&self, _span: SpanHandle) {}
}
