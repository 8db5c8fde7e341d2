//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → read once at startup to attach the dispatcher and start the server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; pages are read once at attach
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheConfig, ListenerConfig, LogFormat, ObservabilityConfig, PagesConfig, RouterConfig,
    SessionConfig,
};
pub use validation::ValidationError;
