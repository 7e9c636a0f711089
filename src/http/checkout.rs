//! `POST /api/create-checkout-session`: forwards the body to the backend.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::error::{json_error, ApiError};
use crate::http::server::AppState;

pub async fn create_checkout_session(State(state): State<AppState>, body: Bytes) -> Response {
    let config = state.settings();

    let result = async {
        let body: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let reply = state
            .backend
            .create_checkout_session(&config.backend.api_url, &body)
            .await?;
        Ok::<_, ApiError>(reply)
    }
    .await;

    match result {
        Ok((status, value)) => (status, Json(value)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Checkout proxy failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Proxy failed")
        }
    }
}
