//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default base URL of the refinement backend.
pub const DEFAULT_API_URL: &str = "https://kaltrium-editor-bot.onrender.com";

/// Root configuration for the site server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Client IP derivation.
    pub client_ip: ClientIpConfig,

    /// Paths that bypass the edge gate.
    pub gate: GateConfig,

    /// Security headers and body limits.
    pub security: SecurityConfig,

    /// Refinement / checkout backend.
    pub backend: BackendConfig,

    /// Site pages, assets and maintenance notice.
    pub site: SiteSection,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for handling one inbound request, in seconds.
    pub request_secs: u64,

    /// Time allowed for one backend call, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 120,
            upstream_secs: 90,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting. Security headers are applied either way.
    pub enabled: bool,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Maximum admitted requests per client IP per window.
    pub max_hits: u32,

    /// Interval for sweeping expired records. 0 disables the sweep.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_hits: 60,
            sweep_interval_secs: 0,
        }
    }
}

/// Where the platform-provided client IP comes from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Header set by the hosting platform that carries the client IP
    /// (e.g. "fly-client-ip"). Checked first when present.
    pub platform_header: Option<String>,

    /// Use the TCP peer address as the platform IP.
    pub use_peer_address: bool,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            platform_header: None,
            use_peer_address: true,
        }
    }
}

/// Routing filter for the edge gate.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Path prefixes that bypass the gate (build-time assets).
    pub excluded_prefixes: Vec<String>,

    /// Exact paths that bypass the gate.
    pub excluded_paths: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec!["/_next/static".to_string(), "/_next/image".to_string()],
            excluded_paths: vec![
                "/favicon.ico".to_string(),
                "/robots.txt".to_string(),
                "/sitemap.xml".to_string(),
            ],
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Production build. Enables Strict-Transport-Security.
    pub production: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Maximum size of an uploaded PDF in bytes.
    pub max_pdf_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            production: false,
            max_body_size: 4 * 1024 * 1024, // 4MB
            max_pdf_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Refinement and checkout backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, without the `/api/...` suffix.
    pub api_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Site content and public URL.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SiteSection {
    /// Public base URL used in the sitemap and robots.txt.
    pub base_url: String,

    /// Show the maintenance banner.
    pub maintenance: bool,

    /// Directory holding pre-built page HTML files.
    pub pages_dir: Option<String>,

    /// Directory served under `static_prefix`.
    pub static_dir: Option<String>,

    /// URL prefix for build-time assets.
    pub static_prefix: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            maintenance: false,
            pages_dir: None,
            static_dir: None,
            static_prefix: "/_next/static".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
