//! Smart Router: rule-based A/B, canary and geo/device request routing.
//!
//! The [`routing`] module is the decision engine and has no I/O. The other
//! modules host it as an HTTP sidecar.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use http::RouterServer;
pub use lifecycle::Shutdown;
pub use routing::{PluginConfig, RequestView, Router, RoutingDecision};
