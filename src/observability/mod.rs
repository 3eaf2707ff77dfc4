//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Host-side subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The routing core never logs; decisions are logged by the HTTP layer
//! - Request ID flows through logs, upstream request and response
//! - Metrics are cheap (no-op until the exporter is installed)

pub mod logging;
pub mod metrics;
