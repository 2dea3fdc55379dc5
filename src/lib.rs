//! Two-stage HTTP relay with swappable instrumentation.

pub mod config;
pub mod http;
pub mod instrumentation;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use instrumentation::Instrumentation;
pub use lifecycle::Shutdown;
pub use observability::Diagnostics;
pub use relay::Role;
