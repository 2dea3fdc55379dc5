//! The two-stage relay.
//!
//! # Data Flow
//! ```text
//! inbound GET /
//!     → invoker.rs (span hop-1, one outbound GET)
//!         → downstream.rs (bounded-time fetch, JSON check)
//!             → greeting.rs (span hop-2, optional masked fault)
//!         ← body forwarded verbatim, or 500 ErrorPayload
//!     ← Envelope
//! ```
//!
//! # Design Decisions
//! - One handler implementation per role, parameterized by `Diagnostics`
//! - Every failure stays inside the invocation that hit it; nothing is retried

pub mod downstream;
pub mod greeting;
pub mod invoker;
pub mod payload;

pub use downstream::{DownstreamClient, DownstreamResponse, FetchError};
pub use greeting::GreetingHandler;
pub use invoker::InvokerHandler;
pub use payload::{ErrorPayload, GreetingPayload};

/// Which hop this process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    /// Relay handler (hop 1).
    Invoker,
    /// Downstream responder (hop 2).
    Greeting,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Invoker => "invoker",
            Role::Greeting => "greeting",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
