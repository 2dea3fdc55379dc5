//! Several backends active at once.

use std::sync::Arc;

use crate::instrumentation::{Instrumentation, SpanContext, SpanHandle};

/// Forwards every call to each child backend.
///
/// All children share the span identity of the outer handle so they report
/// the same trace.
pub struct FanoutInstrumentation {
    backends: Vec<Arc<dyn Instrumentation>>,
}

struct ChildSpans(Vec<SpanHandle>);

impl FanoutInstrumentation {
    pub fn new(backends: Vec<Arc<dyn Instrumentation>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}

impl Instrumentation for FanoutInstrumentation {
    fn name(&self) -> &'static str {
        "fanout"
    }

    fn start_span_with_context(
        &self,
        name: &str,
        attributes: &[(&str, &str)],
        context: SpanContext,
    ) -> SpanHandle {
        let children = self
            .backends
            .iter()
            .map(|backend| backend.start_span_with_context(name, attributes, context.clone()))
            .collect();
        let mut handle = SpanHandle::new(name, attributes, context);
        handle.set_extension(ChildSpans(children));
        handle
    }

    fn record_fault(&self, span: &mut SpanHandle, fault: &str) {
        if let Some(ChildSpans(children)) = span.extension_mut::<ChildSpans>() {
            for (backend, child) in self.backends.iter().zip(children.iter_mut()) {
                backend.record_fault(child, fault);
            }
        }
    }

    fn end_span(&self, mut span: SpanHandle) {
        if let Some(ChildSpans(children)) = span.take_extension::<ChildSpans>() {
            for (backend, child) in self.backends.iter().zip(children) {
                backend.end_span(child);
            }
        }
    }
}
