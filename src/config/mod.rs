//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON, or TOML by extension)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, rule warnings)
//!     → RouterConfig (validated, immutable)
//!     → routing::Router built from config.plugin
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → server rebuilds the Router and swaps it atomically
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Missing or broken config at startup falls back to defaults
//! - Broken config on reload keeps the current rules

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_default, or_default, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RouteHeader, RouterConfig, TimeoutConfig,
};
pub use validation::{lint_config, lint_rules, validate_config, RuleWarning, ValidationError};
