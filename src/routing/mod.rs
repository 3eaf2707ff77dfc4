//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request attributes (headers + :path)
//!     → view.rs (case-insensitive header index)
//!     → router.rs (rules in priority order)
//!     → matcher.rs (evaluate each condition, AND within a rule)
//!         → cookie.rs / query.rs (cookie and query conditions)
//!     → RoutingDecision (first matching rule, or the default target)
//!
//! Rule compilation (at startup and on reload):
//!     PluginConfig.rules
//!     → Stable sort by priority
//!     → Compile matchers (regex patterns included)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - No logging or I/O in this subsystem; the host layer owns both
//! - Deterministic: same input always yields the same decision
//! - Anything unrecognised degrades to "does not match"

pub mod cookie;
pub mod matcher;
pub mod query;
pub mod router;
pub mod types;
pub mod view;

pub use router::Router;
pub use types::{
    Condition, ConditionKind, Operator, PluginConfig, RoutingDecision, RoutingRule,
};
pub use view::RequestView;
