//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, limits)
//!     → middleware/edge_gate.rs (rate limit, security headers)
//!     → refine.rs / checkout.rs (proxy to the backend)
//!       site.rs (pages, sitemap, robots, status)
//!     → Send to client
//! ```

pub mod checkout;
pub mod error;
pub mod middleware;
pub mod refine;
pub mod server;
pub mod site;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
