//! HTTP client for the refinement / checkout backend.

use std::time::{Duration, Instant};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::observability::metrics;
use crate::upstream::types::{BackendReply, PdfUpload, RefineRequest, ReplyBody, UpstreamError};

pub const REFINE_PATH: &str = "/api/refine";
pub const CHECKOUT_PATH: &str = "/api/create-checkout-session";

/// Shared, pooled backend client. Cheap to clone.
///
/// The base URL is passed per call so a reloaded configuration takes effect
/// on the next request.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    timeout_secs: u64,
}

impl BackendClient {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kaltrium-web/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Submit text for refinement or preview.
    pub async fn refine_text(&self, base_url: &str, request: &RefineRequest) -> Result<BackendReply, UpstreamError> {
        let url = endpoint(base_url, REFINE_PATH)?;
        let start = Instant::now();
        let result = self.http.post(url).json(request).send().await;
        self.finish("refine", start, result).await
    }

    /// Submit an uploaded PDF for refinement.
    pub async fn refine_pdf(&self, base_url: &str, upload: PdfUpload) -> Result<BackendReply, UpstreamError> {
        let url = endpoint(base_url, REFINE_PATH)?;
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name)
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("file", part)
            .text("preview", if upload.preview { "true" } else { "false" });

        let start = Instant::now();
        let result = self.http.post(url).multipart(form).send().await;
        self.finish("refine_pdf", start, result).await
    }

    /// Forward a checkout request body verbatim. The reply must be JSON.
    pub async fn create_checkout_session(
        &self,
        base_url: &str,
        body: &serde_json::Value,
    ) -> Result<(StatusCode, serde_json::Value), UpstreamError> {
        let url = endpoint(base_url, CHECKOUT_PATH)?;
        let start = Instant::now();
        let result = self.http.post(url).json(body).send().await;
        let response = self.check_sent("checkout", start, result)?;

        let status = response.status();
        let value = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok((status, value))
    }

    async fn finish(
        &self,
        endpoint: &'static str,
        start: Instant,
        result: reqwest::Result<reqwest::Response>,
    ) -> Result<BackendReply, UpstreamError> {
        let response = self.check_sent(endpoint, start, result)?;
        read_reply(response).await
    }

    fn check_sent(
        &self,
        endpoint: &'static str,
        start: Instant,
        result: reqwest::Result<reqwest::Response>,
    ) -> Result<reqwest::Response, UpstreamError> {
        match result {
            Ok(response) => {
                let outcome = if response.status().is_success() { "ok" } else { "error_status" };
                metrics::record_upstream(endpoint, outcome, start);
                tracing::debug!(endpoint, status = %response.status(), elapsed_ms = start.elapsed().as_millis() as u64, "Backend replied");
                Ok(response)
            }
            Err(e) if e.is_timeout() => {
                metrics::record_upstream(endpoint, "timeout", start);
                Err(UpstreamError::Timeout(self.timeout_secs))
            }
            Err(e) => {
                metrics::record_upstream(endpoint, "transport_error", start);
                Err(UpstreamError::Transport(e))
            }
        }
    }
}

async fn read_reply(response: reqwest::Response) -> Result<BackendReply, UpstreamError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let body = if content_type.contains("application/pdf") {
        ReplyBody::Pdf(response.bytes().await?)
    } else if content_type.contains("application/json") {
        let bytes = response.bytes().await?;
        let value = serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        ReplyBody::Json(value)
    } else {
        ReplyBody::Other(response.text().await?)
    };

    Ok(BackendReply { status, body })
}

/// Join the backend base URL and an API path.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url, UpstreamError> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|_| UpstreamError::InvalidUrl(joined))
}
