//! Routing subsystem: which requests the edge gate governs.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → GateScope::governs (exclusion lookup)
//!     → matcher.rs (exact / prefix conditions)
//!     → true: request goes through the gate
//!       false: request bypasses the gate entirely
//! ```
//!
//! # Design Decisions
//! - Exclusions compiled at startup, immutable at runtime
//! - No regex in hot path (prefix and exact matching only)

pub mod matcher;

use crate::config::GateConfig;
use matcher::{AnyMatcher, ExactPathMatcher, PathMatcher, PathPrefixMatcher};

/// Compiled routing filter for the edge gate.
#[derive(Debug)]
pub struct GateScope {
    excluded: AnyMatcher,
}

impl GateScope {
    pub fn from_config(config: &GateConfig) -> Self {
        let mut matchers: Vec<Box<dyn PathMatcher>> = Vec::new();
        for prefix in &config.excluded_prefixes {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }
        for path in &config.excluded_paths {
            matchers.push(Box::new(ExactPathMatcher::new(path.clone())));
        }
        Self {
            excluded: AnyMatcher::new(matchers),
        }
    }

    /// Returns true if requests to `path` go through the gate.
    pub fn governs(&self, path: &str) -> bool {
        !self.excluded.matches(path)
    }
}

impl Default for GateScope {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}
