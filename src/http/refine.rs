//! `POST /api/refine`: text or PDF refinement through the backend.
//!
//! # Design Decisions
//! - Input problems are client errors: unparseable JSON is a 400
//!   `Invalid JSON`, and a `text` that is missing, empty or not a string is a
//!   400 `No text`. Neither reaches the backend.
//! - Only failures talking to the backend are 500 (504 on timeout).

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{multipart::MultipartError, FromRequest, Multipart, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, Request, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};

use crate::http::error::{json_error, ApiError};
use crate::http::server::AppState;
use crate::upstream::{BackendReply, PdfUpload, RefineRequest, ReplyBody};

/// Longest backend error excerpt passed back to the client, in characters.
const ERROR_EXCERPT_CHARS: usize = 200;

pub async fn refine(State(state): State<AppState>, request: Request<Body>) -> Response {
    match handle(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(error = %e, "POST /api/refine failed");
            } else {
                tracing::debug!(error = %e, "POST /api/refine rejected");
            }
            e.into_response()
        }
    }
}

async fn handle(state: &AppState, request: Request<Body>) -> Result<Response, ApiError> {
    let config = state.settings();
    let api_url = config.backend.api_url.as_str();

    let reply = if is_multipart(request.headers()) {
        let upload = read_pdf_upload(request, config.security.max_pdf_bytes).await?;
        tracing::info!(file = %upload.file_name, bytes = upload.bytes.len(), preview = upload.preview, "Forwarding PDF for refinement");
        state.backend.refine_pdf(api_url, upload).await?
    } else {
        let body = read_text_request(request, config.security.max_body_size).await?;
        tracing::info!(chars = body.text.chars().count(), preview = body.preview, "Forwarding text for refinement");
        state.backend.refine_text(api_url, &body).await?
    };

    Ok(reply_response(reply))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Parse `{text, preview}`. Text must be a non-empty string; preview
/// defaults to false.
async fn read_text_request(request: Request<Body>, limit: usize) -> Result<RefineRequest, ApiError> {
    let bytes = to_bytes(request.into_body(), limit)
        .await
        .map_err(|_| ApiError::PayloadTooLarge("Request body too large".into()))?;
    parse_text_request(&bytes)
}

fn parse_text_request(bytes: &Bytes) -> Result<RefineRequest, ApiError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|_| ApiError::BadRequest("Invalid JSON".into()))?;

    let text = value
        .get("text")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No text".into()))?;
    let preview = value
        .get("preview")
        .and_then(|p| p.as_bool())
        .unwrap_or(false);

    Ok(RefineRequest {
        text: text.to_string(),
        preview,
    })
}

async fn read_pdf_upload(request: Request<Body>, max_pdf_bytes: usize) -> Result<PdfUpload, ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut file = None;
    let mut preview = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                if field.content_type() != Some("application/pdf") {
                    return Err(ApiError::BadRequest("Only PDF files are allowed.".into()));
                }
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.len() > max_pdf_bytes {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "PDF is too large (max {} MB).",
                        max_pdf_bytes / (1024 * 1024)
                    )));
                }
                file = Some((file_name, bytes));
            }
            Some("preview") => {
                let value = field.text().await.map_err(multipart_error)?;
                preview = matches!(value.trim(), "true" | "1");
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::BadRequest("No file".into()))?;
    Ok(PdfUpload {
        file_name,
        bytes,
        preview,
    })
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Shape a backend reply for the browser.
pub fn reply_response(reply: BackendReply) -> Response {
    let status = reply.status;
    match reply.body {
        ReplyBody::Pdf(bytes) => (
            status,
            [
                (CONTENT_TYPE, "application/pdf"),
                (CONTENT_DISPOSITION, "attachment; filename=refined.pdf"),
            ],
            bytes,
        )
            .into_response(),
        ReplyBody::Json(value) => (status, Json(value)).into_response(),
        ReplyBody::Other(text) => {
            let excerpt: String = text.chars().take(ERROR_EXCERPT_CHARS).collect();
            tracing::warn!(status = %status, "Backend returned a non-JSON reply");
            json_error(status, format!("Backend error ({}): {}", status.as_u16(), excerpt))
        }
    }
}
