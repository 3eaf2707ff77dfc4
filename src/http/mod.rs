//! HTTP host subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → request.rs (attribute map: :path + headers)
//!     → routing::Router (decision)
//!     → decision.rs (x-route-target, attribution headers, add/remove)
//!     → upstream.rs (target → upstream URI)
//!     → hyper-util client → upstream
//!     → response + X-Smart-Router: active
//! ```

pub mod decision;
pub mod request;
pub mod server;
pub mod upstream;

pub use decision::apply_decision;
pub use request::{request_attributes, X_REQUEST_ID};
pub use server::RouterServer;
