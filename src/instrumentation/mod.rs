//! Instrumentation capability shared by both relay handlers.
//!
//! # Data Flow
//! ```text
//! handler
//!     → SpanGuard::start (start_span)
//!     → SpanGuard::record_fault (zero or more)
//!     → SpanGuard::finish / Drop (end_span, exactly once)
//!
//! Backends:
//!     → noop.rs (disabled)
//!     → otel.rs (vendor-neutral tracing spans)
//!     → vendor.rs (APM agent transactions)
//!     → fanout.rs (several of the above at once)
//! ```
//!
//! # Design Decisions
//! - Handlers only see `dyn Instrumentation`; the bound backend is chosen by config
//! - `end_span` consumes the handle, so a span cannot be closed twice
//! - The guard closes on drop, covering cancelled invocations

pub mod context;
pub mod fanout;
pub mod noop;
pub mod otel;
pub mod vendor;

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{InstrumentationVariant, RelayConfig};

pub use context::{SpanContext, TraceParent, TRACEPARENT};
pub use fanout::FanoutInstrumentation;
pub use noop::NoopInstrumentation;
pub use otel::OtelInstrumentation;
pub use vendor::VendorAgent;

/// One instrumented operation, owned by the invocation that opened it.
pub struct SpanHandle {
    name: String,
    context: SpanContext,
    attributes: Vec<(String, String)>,
    started: Instant,
    faults: u32,
    extension: Option<Box<dyn Any + Send + Sync>>,
}

impl SpanHandle {
    /// Create a handle. Backends call this from `start_span_with_context`.
    pub fn new(name: &str, attributes: &[(&str, &str)], context: SpanContext) -> Self {
        Self {
            name: name.to_string(),
            context,
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            started: Instant::now(),
            faults: 0,
            extension: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Look up one attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Faults recorded through the owning guard.
    pub fn fault_count(&self) -> u32 {
        self.faults
    }

    /// Attach backend-private state.
    pub fn set_extension<T: Any + Send + Sync>(&mut self, value: T) {
        self.extension = Some(Box::new(value));
    }

    pub fn extension_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.extension.as_mut().and_then(|ext| ext.downcast_mut::<T>())
    }

    /// Remove backend-private state, leaving the handle without one.
    pub fn take_extension<T: Any + Send + Sync>(&mut self) -> Option<T> {
        match self.extension.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                self.extension = Some(other);
                None
            }
        }
    }
}

impl std::fmt::Debug for SpanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanHandle")
            .field("name", &self.name)
            .field("trace_id", &self.context.trace_id_hex())
            .field("span_id", &self.context.span_id_hex())
            .field("attributes", &self.attributes)
            .field("faults", &self.faults)
            .finish()
    }
}

/// A swappable tracing backend.
///
/// Every method must be cheap and infallible: instrumentation never changes
/// what a handler returns.
pub trait Instrumentation: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Open a span with an explicit identity.
    fn start_span_with_context(
        &self,
        name: &str,
        attributes: &[(&str, &str)],
        context: SpanContext,
    ) -> SpanHandle;

    /// Record a fault on an open span. May be called any number of times.
    fn record_fault(&self, span: &mut SpanHandle, fault: &str);

    /// Close a span.
    fn end_span(&self, span: SpanHandle);

    /// Open a span that starts a new trace.
    fn start_span(&self, name: &str, attributes: &[(&str, &str)]) -> SpanHandle {
        self.start_span_with_context(name, attributes, SpanContext::root())
    }
}

/// Owns an open span and closes it exactly once.
///
/// Call [`SpanGuard::finish`] on normal exits; dropping the guard (for
/// example when an invocation is cancelled at an await point) closes it too.
pub struct SpanGuard {
    backend: Arc<dyn Instrumentation>,
    span: Option<SpanHandle>,
}

impl SpanGuard {
    pub fn start(
        backend: Arc<dyn Instrumentation>,
        name: &str,
        attributes: &[(&str, &str)],
        parent: Option<&TraceParent>,
    ) -> Self {
        let span = backend.start_span_with_context(name, attributes, SpanContext::from_parent(parent));
        Self {
            backend,
            span: Some(span),
        }
    }

    pub fn record_fault(&mut self, fault: &str) {
        if let Some(span) = self.span.as_mut() {
            span.faults += 1;
            self.backend.record_fault(span, fault);
        }
    }

    /// `traceparent` value for calls made on behalf of this span.
    pub fn traceparent(&self) -> Option<TraceParent> {
        self.span.as_ref().map(|span| span.context().traceparent())
    }

    pub fn finish(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(span) = self.span.take() {
            self.backend.end_span(span);
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Bind the configured backends.
pub fn from_config(config: &RelayConfig) -> Arc<dyn Instrumentation> {
    let instrumentation = &config.instrumentation;
    let mut backends: Vec<Arc<dyn Instrumentation>> = Vec::new();

    for variant in instrumentation.active_variants() {
        match variant {
            InstrumentationVariant::None => {}
            InstrumentationVariant::OpenStandard => {
                backends.push(Arc::new(OtelInstrumentation::new(&config.service_name)));
            }
            InstrumentationVariant::Vendor => {
                backends.push(Arc::new(VendorAgent::new(
                    instrumentation.vendor_credential.clone().unwrap_or_default(),
                    instrumentation.vendor_account_id.clone(),
                    &config.service_name,
                )));
            }
        }
    }

    match backends.len() {
        0 => Arc::new(NoopInstrumentation),
        1 => backends.remove(0),
        _ => Arc::new(FanoutInstrumentation::new(backends)),
    }
}
