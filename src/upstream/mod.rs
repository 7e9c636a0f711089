//! Client side of the external refinement and checkout backend.
//!
//! # Data Flow
//! ```text
//! /api/refine, /api/create-checkout-session handlers
//!     → client.rs (POST to {api_url}/api/...)
//!     → types.rs (classify reply: PDF, JSON, other)
//!     → handler shapes the client response
//! ```

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::{BackendReply, PdfUpload, RefineRequest, ReplyBody, UpstreamError};
