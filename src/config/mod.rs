//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (apply deployment-injected values)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → handed to each handler at construction
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start; handlers never consult the environment
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, read_config, ConfigError};
pub use schema::{
    DownstreamConfig, GreetingConfig, InstrumentationConfig, InstrumentationVariant,
    ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
