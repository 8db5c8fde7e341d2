//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request-scoped spans)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing` fields, never formatted strings
//! - Request ID and session flow through the dispatch span
//! - Metrics are cheap facade calls; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
