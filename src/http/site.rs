//! Site routes: pages, sitemap.xml, robots.txt and the status endpoint.

use std::path::Path;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::site::{pages, sitemap};

pub async fn sitemap_xml(State(state): State<AppState>) -> Response {
    let config = state.settings();
    let lastmod = chrono::Utc::now().format("%Y-%m-%d").to_string();
    (
        [(CONTENT_TYPE, "application/xml")],
        sitemap::render_sitemap(&config.site.base_url, &lastmod),
    )
        .into_response()
}

pub async fn robots_txt(State(state): State<AppState>) -> Response {
    let config = state.settings();
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        sitemap::render_robots(&config.site.base_url),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct SiteStatus {
    pub ok: bool,
    pub maintenance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
    pub version: &'static str,
}

pub async fn status(State(state): State<AppState>) -> Json<SiteStatus> {
    let maintenance = state.settings().site.maintenance;
    Json(SiteStatus {
        ok: true,
        maintenance,
        notice: maintenance.then_some(pages::MAINTENANCE_NOTICE),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fallback: serve a known page from the pages directory.
pub async fn page(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let Some(page) = pages::find(uri.path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let config = state.settings();
    let Some(dir) = config.site.pages_dir.as_deref() else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let path = pages::file_path(Path::new(dir), page);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) if config.site.maintenance => Html(pages::with_banner(&html)).into_response(),
        Ok(html) => Html(html).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Page file missing");
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
