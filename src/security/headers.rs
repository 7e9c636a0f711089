//! Security response headers.
//!
//! The header set is fixed. Strict-Transport-Security is only emitted for
//! production builds so local HTTP development is not pinned to HTTPS.

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_SECURITY_POLICY, REFERRER_POLICY,
    STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::response::Response;

pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

pub const CSP_VALUE: &str = "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self' data:; connect-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self' https://formspree.io";
pub const NOSNIFF_VALUE: &str = "nosniff";
pub const FRAME_OPTIONS_VALUE: &str = "DENY";
pub const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";
pub const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), microphone=(), camera=(), payment=(), usb=()";
pub const HSTS_VALUE: &str = "max-age=15552000; includeSubDomains";

/// The header policy stamped on admitted responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaders {
    production: bool,
}

impl SecurityHeaders {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Header pairs in the order they are applied.
    pub fn entries(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut entries = vec![
            (CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP_VALUE)),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF_VALUE)),
            (X_FRAME_OPTIONS, HeaderValue::from_static(FRAME_OPTIONS_VALUE)),
            (REFERRER_POLICY, HeaderValue::from_static(REFERRER_POLICY_VALUE)),
            (PERMISSIONS_POLICY, HeaderValue::from_static(PERMISSIONS_POLICY_VALUE)),
        ];
        if self.production {
            entries.push((STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE)));
        }
        entries
    }

    /// Overwrite the policy headers in `headers`.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, value) in self.entries() {
            headers.insert(name, value);
        }
    }

    /// Stamp `response` with the policy. The body is untouched.
    pub fn apply(&self, mut response: Response) -> Response {
        self.apply_to(response.headers_mut());
        response
    }
}
