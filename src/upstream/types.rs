//! Wire types for the refinement and checkout backend.

use axum::body::Bytes;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text refinement request as the backend expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineRequest {
    pub text: String,
    #[serde(default)]
    pub preview: bool,
}

/// A PDF uploaded by the client, forwarded as multipart.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub file_name: String,
    pub bytes: Bytes,
    pub preview: bool,
}

/// Body of a backend reply, classified by its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Pdf(Bytes),
    Json(serde_json::Value),
    /// Anything else, usually an HTML error page.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: ReplyBody,
}

/// Errors talking to the backend.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend did not answer within {0} seconds")]
    Timeout(u64),

    #[error("invalid backend URL {0:?}")]
    InvalidUrl(String),

    #[error("backend sent an unreadable response: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout(_))
    }
}
