//! Vendor-neutral tracing backend.
//!
//! Spans are emitted through `tracing` with OpenTelemetry semantic field
//! names (`otel.name`, `otel.kind`, `otel.status_code`, `exception.message`),
//! so any OpenTelemetry bridge layer installed on the subscriber exports them
//! without further mapping.

use tracing::field::Empty;

use crate::instrumentation::{Instrumentation, SpanContext, SpanHandle};

/// Open-standard tracer.
#[derive(Debug, Clone)]
pub struct OtelInstrumentation {
    service_name: String,
}

struct OtelSpan {
    span: tracing::Span,
    faults: u32,
}

impl OtelInstrumentation {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
        }
    }
}

impl Instrumentation for OtelInstrumentation {
    fn name(&self) -> &'static str {
        "otel"
    }

    fn start_span_with_context(
        &self,
        name: &str,
        attributes: &[(&str, &str)],
        context: SpanContext,
    ) -> SpanHandle {
        let span = tracing::info_span!(
            target: "otel",
            "span",
            otel.name = %name,
            otel.kind = "server",
            otel.status_code = Empty,
            service.name = %self.service_name,
            trace_id = %context.trace_id_hex(),
            span_id = %context.span_id_hex(),
            parent_span_id = Empty,
            attributes = ?attributes,
            error.occurred = Empty,
            exception.message = Empty,
        );
        if let Some(parent) = context.parent_span_id_hex() {
            span.record("parent_span_id", parent.as_str());
        }

        let mut handle = SpanHandle::new(name, attributes, context);
        handle.set_extension(OtelSpan { span, faults: 0 });
        handle
    }

    fn record_fault(&self, span: &mut SpanHandle, fault: &str) {
        if let Some(state) = span.extension_mut::<OtelSpan>() {
            state.faults += 1;
            state.span.record("otel.status_code", "ERROR");
            state.span.record("error.occurred", true);
            state.span.record("exception.message", fault);
            state.span.in_scope(|| {
                tracing::event!(target: "otel", tracing::Level::ERROR, exception.message = %fault, "exception");
            });
        }
    }

    fn end_span(&self, mut span: SpanHandle) {
        let elapsed = span.elapsed();
        if let Some(state) = span.take_extension::<OtelSpan>() {
            if state.faults == 0 {
                state.span.record("otel.status_code", "OK");
            }
            state.span.in_scope(|| {
                tracing::debug!(
                    target: "otel",
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    faults = state.faults,
                    "span ended"
                );
            });
            // Dropping the last handle closes the tracing span.
            drop(state.span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::format::FmtSpan;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_fault_is_exported_as_exception() {
        let tracer = OtelInstrumentation::new("relay-test");
        let output = capture(|| {
            let mut span = tracer.start_span("greeting-lambda-handler", &[("hop", "hop-2")]);
            tracer.record_fault(&mut span, "simulated");
            tracer.end_span(span);
        });

        assert!(output.contains("greeting-lambda-handler"));
        assert!(output.contains("exception"));
        assert!(output.contains("exception.message=simulated"));
        assert!(output.contains("ERROR"));
        assert!(output.contains("close"));
    }

    #[test]
    fn test_clean_span_reports_ok() {
        let tracer = OtelInstrumentation::new("relay-test");
        let output = capture(|| {
            let span = tracer.start_span("invoker-lambda-handler", &[]);
            tracer.end_span(span);
        });

        assert!(output.contains("span ended"));
        assert!(output.contains("faults=0"));
        assert!(!output.contains("exception"));
    }
}
