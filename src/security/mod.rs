//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → routing::GateScope (excluded asset paths skip everything below)
//!     → client_ip.rs (derive the rate-limit key)
//!     → rate_limit.rs (fixed-window check, 429 on deny)
//!     → handler
//!     → headers.rs (stamp security headers on the admitted response)
//! ```
//!
//! # Design Decisions
//! - The gate is synchronous and in-memory; no I/O before the handler runs
//! - Registry and clock are injected so tests control both
//! - Limits are per process instance

pub mod client_ip;
pub mod clock;
pub mod gate;
pub mod headers;
pub mod rate_limit;

pub use gate::EdgeGate;
pub use rate_limit::{ClientHitRecord, Decision, FixedWindowLimiter, HitRegistry};
