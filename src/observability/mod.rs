//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Boundary code (http, admin, data, bridge) produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every listener
//! - The routing core never logs; its callers do

pub mod logging;
pub mod metrics;
