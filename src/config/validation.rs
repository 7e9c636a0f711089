//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, budget > 0)
//! - Check addresses and URLs parse
//! - Check gate exclusions and the static prefix are absolute paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::SiteConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid {field}: {value:?} is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("gate exclusion {0:?} must start with '/'")]
    RelativeExclusion(String),

    #[error("site.static_prefix {0:?} must start with '/', not end with '/', and not be the root")]
    InvalidStaticPrefix(String),

    #[error("client_ip.platform_header {0:?} is not a valid header name")]
    InvalidHeaderName(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.window_ms" });
    }
    if config.rate_limit.max_hits == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.max_hits" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs" });
    }

    check_url(&mut errors, "backend.api_url", &config.backend.api_url);
    check_url(&mut errors, "site.base_url", &config.site.base_url);

    for path in config
        .gate
        .excluded_prefixes
        .iter()
        .chain(config.gate.excluded_paths.iter())
    {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativeExclusion(path.clone()));
        }
    }

    let prefix = &config.site.static_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::InvalidStaticPrefix(prefix.clone()));
    }

    if let Some(name) = &config.client_ip.platform_header {
        if axum::http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let ok = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
