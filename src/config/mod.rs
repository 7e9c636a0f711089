//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse, environment overrides)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → shared via ArcSwap to request handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<SiteConfig>
//!     → handlers observe new backend / site settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Gate policy (window, budget, exclusions) is fixed at startup

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load, load_config, ConfigError};
pub use schema::{
    BackendConfig, ClientIpConfig, GateConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RateLimitConfig, SecurityConfig, SiteConfig, SiteSection, TimeoutConfig,
};
