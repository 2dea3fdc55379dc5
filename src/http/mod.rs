//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer, deadline)
//!     → request.rs (request ID, method, path, traceparent → Invocation)
//!     → crate::relay (role handler)
//!     → response.rs (Envelope → HTTP response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Invocation, X_REQUEST_ID};
pub use response::Envelope;
pub use server::HttpServer;
