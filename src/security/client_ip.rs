//! Client IP derivation.
//!
//! Order of preference:
//! 1. the platform-provided IP (trusted platform header, then TCP peer address)
//! 2. the first entry of `X-Forwarded-For`
//! 3. the shared fallback bucket `0.0.0.0`
//!
//! Clients that reach the fallback all share one budget. That is a permissive
//! default, not a security boundary.

use std::net::SocketAddr;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, Request};

use crate::config::ClientIpConfig;

pub const FALLBACK_IP: &str = "0.0.0.0";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolves the rate-limit key for a request.
#[derive(Debug, Clone)]
pub struct ClientIpResolver {
    platform_header: Option<HeaderName>,
    use_peer_address: bool,
}

impl ClientIpResolver {
    pub fn new(config: &ClientIpConfig) -> Self {
        Self {
            platform_header: config
                .platform_header
                .as_deref()
                .and_then(|name| HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes()).ok()),
            use_peer_address: config.use_peer_address,
        }
    }

    pub fn resolve<B>(&self, request: &Request<B>) -> String {
        let peer = if self.use_peer_address {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr)
        } else {
            None
        };
        self.resolve_parts(request.headers(), peer)
    }

    pub fn resolve_parts(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if let Some(ip) = self.platform_ip(headers, peer) {
            return ip;
        }
        forwarded_for(headers).unwrap_or_else(|| FALLBACK_IP.to_string())
    }

    fn platform_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        let from_header = self
            .platform_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        from_header.or_else(|| peer.map(|addr| addr.ip().to_string()))
    }
}

impl Default for ClientIpResolver {
    fn default() -> Self {
        Self::new(&ClientIpConfig::default())
    }
}

/// First comma-separated entry of `X-Forwarded-For`, trimmed.
pub fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
