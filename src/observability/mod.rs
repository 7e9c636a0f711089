//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Edge gate, API handlers, backend client:
//!     → logging.rs (tracing subscriber, pretty or JSON)
//!     → metrics.rs (request counts and latency, 429s, registry size,
//!                   backend call outcomes)
//!
//! Consumers:
//!     → stdout (one JSON object per event in production)
//!     → Prometheus scrape listener, when enabled
//! ```
//!
//! # Design Decisions
//! - Every request span carries its x-request-id
//! - Recording a metric without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
