//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers produce:
//!     → diagnostics.rs (one facade over both sinks)
//!         → logging.rs (structured log events, fire-and-forget)
//!         → crate::instrumentation (spans on the bound backend)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Tracing/APM backends (via the instrumentation capability)
//! ```
//!
//! # Design Decisions
//! - Neither sink can fail a request or change its status
//! - Request ID flows through log fields and span attributes
//! - Metrics are cheap (atomic increments)

pub mod diagnostics;
pub mod logging;
pub mod metrics;

pub use diagnostics::Diagnostics;
