//! Edge server for the Kaltrium site: rate limiting and security headers in
//! front of the pages, plus the API routes that proxy to the refinement and
//! checkout backend.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod site;
pub mod upstream;

pub use config::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::EdgeGate;
