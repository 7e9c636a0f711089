//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::SiteConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Backend base URL override.
pub const ENV_API_URL: &str = "KALTRIUM_API_URL";
/// Public site URL override.
pub const ENV_SITE_URL: &str = "KALTRIUM_SITE_URL";
/// Maintenance banner switch ("1" or "true").
pub const ENV_MAINTENANCE: &str = "KALTRIUM_MAINTENANCE";
/// Build profile; "production" enables HSTS.
pub const ENV_PROFILE: &str = "KALTRIUM_ENV";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, and validate.
pub fn load(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => SiteConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    load(Some(path))
}

fn parse_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment-provided values on top of file configuration.
///
/// Empty values are ignored so an exported-but-blank variable does not wipe
/// the configured one.
pub fn apply_env_overrides<F>(config: &mut SiteConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = get(ENV_API_URL) {
        config.backend.api_url = url;
    }
    if let Some(url) = get(ENV_SITE_URL) {
        config.site.base_url = url;
    }
    if let Some(flag) = get(ENV_MAINTENANCE) {
        config.site.maintenance = flag == "1" || flag.eq_ignore_ascii_case("true");
    }
    if let Some(profile) = get(ENV_PROFILE) {
        config.security.production = profile.eq_ignore_ascii_case("production");
    }
}
