//! The edge request gate: routing filter, rate limit and header policy in
//! one component that the HTTP middleware drives.

use std::sync::Arc;
use axum::http::{Method, Request};
use axum::response::Response;

use crate::config::SiteConfig;
use crate::routing::GateScope;
use crate::security::client_ip::ClientIpResolver;
use crate::security::headers::SecurityHeaders;
use crate::security::rate_limit::{Decision, FixedWindowLimiter};

pub struct EdgeGate {
    scope: GateScope,
    resolver: ClientIpResolver,
    limiter: Arc<FixedWindowLimiter>,
    headers: SecurityHeaders,
    rate_limit_enabled: bool,
}

impl EdgeGate {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            GateScope::from_config(&config.gate),
            ClientIpResolver::new(&config.client_ip),
            Arc::new(FixedWindowLimiter::new(&config.rate_limit)),
            SecurityHeaders::new(config.security.production),
        )
        .with_rate_limit_enabled(config.rate_limit.enabled)
    }

    pub fn new(
        scope: GateScope,
        resolver: ClientIpResolver,
        limiter: Arc<FixedWindowLimiter>,
        headers: SecurityHeaders,
    ) -> Self {
        Self {
            scope,
            resolver,
            limiter,
            headers,
            rate_limit_enabled: true,
        }
    }

    pub fn with_rate_limit_enabled(mut self, enabled: bool) -> Self {
        self.rate_limit_enabled = enabled;
        self
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }

    /// Returns true if the gate applies to requests for `path`.
    pub fn governs(&self, path: &str) -> bool {
        self.scope.governs(path)
    }

    pub fn client_ip<B>(&self, request: &Request<B>) -> String {
        self.resolver.resolve(request)
    }

    /// Decide whether a governed request may proceed.
    ///
    /// Pre-flight requests are admitted without touching the registry.
    pub fn admit<B>(&self, request: &Request<B>) -> Decision {
        if request.method() == Method::OPTIONS || !self.rate_limit_enabled {
            return Decision::Admit;
        }
        let ip = self.client_ip(request);
        self.limiter.check(&ip)
    }

    pub fn apply_security_headers(&self, response: Response) -> Response {
        self.headers.apply(response)
    }
}
