//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → BACKEND_URL / PORT overrides
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → target.rs (BackendTarget, shared via Arc to every request)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod target;
pub mod validation;

pub use loader::{load_config, ConfigError, Overrides};
pub use schema::{
    BackendConfig, CompressionConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    TimeoutConfig,
};
pub use target::{BackendTarget, TargetError};
pub use validation::ValidationError;
