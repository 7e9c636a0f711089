//! Path matching logic.
//!
//! # Responsibilities
//! - Match exact paths
//! - Match path prefixes
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against conditions.
pub trait PathMatcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches one path exactly.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl PathMatcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> bool {
        path == self.path
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl PathMatcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches when any inner matcher does.
#[derive(Debug, Default)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn PathMatcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn PathMatcher>>) -> Self {
        Self { matchers }
    }
}

impl PathMatcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}
