//! End-to-end tests: real listener, real backend client, stand-in backend.

mod common;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use kaltrium_web::SiteConfig;

/// What the stand-in backend saw.
#[derive(Default)]
struct Seen {
    refine: Vec<Value>,
    uploads: Vec<(String, String, usize, String)>,
    checkout: Vec<Value>,
}

type Shared = Arc<Mutex<Seen>>;

async fn refine_json(State(seen): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let preview = body["preview"].as_bool().unwrap_or(false);
    seen.lock().unwrap().refine.push(body);
    Json(json!({ "ok": true, "refined": "Polished text", "preview": preview }))
}

async fn refine_pdf_reply() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/pdf")],
        b"%PDF-1.7 refined".to_vec(),
    )
}

async fn refine_html_error() -> impl IntoResponse {
    let page = format!("<html><body>{}</body></html>", "x".repeat(500));
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/html")],
        page,
    )
}

async fn refine_rejects() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "ok": false, "error": "Text too long" })),
    )
}

async fn refine_upload(State(seen): State<Shared>, mut multipart: Multipart) -> impl IntoResponse {
    let mut file = None;
    let mut preview = String::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let len = field.bytes().await.unwrap().len();
                file = Some((name, content_type, len));
            }
            Some("preview") => preview = field.text().await.unwrap(),
            _ => {}
        }
    }
    let (name, content_type, len) = file.unwrap();
    seen.lock().unwrap().uploads.push((name, content_type, len, preview));
    Json(json!({ "ok": true }))
}

async fn checkout(State(seen): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.lock().unwrap().checkout.push(body);
    Json(json!({ "url": "https://checkout.example.com/session/cs_test_1" }))
}

async fn checkout_html() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")], "<html>oops</html>")
}

/// Stand-in backend whose `/api/refine` is served by `refine`.
async fn backend(refine: Router<Shared>) -> (SocketAddr, Shared) {
    let seen = Shared::default();
    let router = refine
        .route("/api/create-checkout-session", post(checkout))
        .with_state(seen.clone());
    (common::start_mock_backend(router).await, seen)
}

fn config_for(backend: SocketAddr) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.backend.api_url = format!("http://{}", backend);
    config
}

/// An address nothing is listening on.
async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn test_refine_text_passthrough() {
    let (backend_addr, seen) = backend(Router::new().route("/api/refine", post(refine_json))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .json(&json!({ "text": "hello wrld", "preview": true }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("content-security-policy").is_some());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["refined"], "Polished text");
    assert_eq!(body["preview"], true);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.refine, vec![json!({ "text": "hello wrld", "preview": true })]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_preview_defaults_to_false() {
    let (backend_addr, seen) = backend(Router::new().route("/api/refine", post(refine_json))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(seen.lock().unwrap().refine[0]["preview"], false);

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_backend_status_is_kept() {
    let (backend_addr, _) = backend(Router::new().route("/api/refine", post(refine_rejects))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": false, "error": "Text too long" }));

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_missing_text_is_rejected_locally() {
    let (backend_addr, seen) = backend(Router::new().route("/api/refine", post(refine_json))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;
    let client = common::client();

    for body in [json!({}), json!({ "text": "" }), json!({ "text": 42 })] {
        let resp = client
            .post(format!("http://{}/api/refine", addr))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "ok": false, "error": "No text" }));
    }

    let resp = client
        .post(format!("http://{}/api/refine", addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON");

    assert!(seen.lock().unwrap().refine.is_empty());
    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_pdf_reply_is_downloaded() {
    let (backend_addr, _) = backend(Router::new().route("/api/refine", post(refine_pdf_reply))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=refined.pdf"
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"%PDF-1.7 refined");

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_non_json_reply_is_wrapped() {
    let (backend_addr, _) = backend(Router::new().route("/api/refine", post(refine_html_error))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Backend error (502): <html><body>xxx"));
    assert_eq!(error.len(), "Backend error (502): ".len() + 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_unreachable_backend() {
    let (addr, shutdown) = common::start_site(config_for(closed_addr().await)).await;

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_pdf_upload_is_forwarded() {
    let (backend_addr, seen) = backend(Router::new().route("/api/refine", post(refine_upload))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let part = reqwest::multipart::Part::bytes(vec![b'%'; 1024])
        .file_name("essay.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("preview", "true");

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.uploads,
        vec![("essay.pdf".to_string(), "application/pdf".to_string(), 1024, "true".to_string())]
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_upload_must_be_pdf() {
    let (backend_addr, seen) = backend(Router::new().route("/api/refine", post(refine_upload))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let part = reqwest::multipart::Part::bytes(b"plain words".to_vec())
        .file_name("essay.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Only PDF files are allowed.");
    assert!(seen.lock().unwrap().uploads.is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_refine_upload_size_limit() {
    let (backend_addr, seen) = backend(Router::new().route("/api/refine", post(refine_upload))).await;
    let mut config = config_for(backend_addr);
    config.security.max_pdf_bytes = 1024 * 1024;
    let (addr, shutdown) = common::start_site(config).await;

    let part = reqwest::multipart::Part::bytes(vec![0u8; 1024 * 1024 + 1])
        .file_name("big.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = common::client()
        .post(format!("http://{}/api/refine", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "PDF is too large (max 1 MB).");
    assert!(seen.lock().unwrap().uploads.is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_checkout_passthrough() {
    let (backend_addr, seen) = backend(Router::new().route("/api/refine", post(refine_json))).await;
    let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;

    let resp = common::client()
        .post(format!("http://{}/api/create-checkout-session", addr))
        .json(&json!({ "plan": "pro", "email": "a@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["url"], "https://checkout.example.com/session/cs_test_1");
    assert_eq!(
        seen.lock().unwrap().checkout,
        vec![json!({ "plan": "pro", "email": "a@example.com" })]
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_checkout_failures_become_proxy_failed() {
    let bad_backend = Router::new().route("/api/create-checkout-session", post(checkout_html));
    let bad_addr = common::start_mock_backend(bad_backend).await;
    let client = common::client();

    for backend_addr in [closed_addr().await, bad_addr] {
        let (addr, shutdown) = common::start_site(config_for(backend_addr)).await;
        let resp = client
            .post(format!("http://{}/api/create-checkout-session", addr))
            .json(&json!({ "plan": "pro" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "ok": false, "error": "Proxy failed" }));
        shutdown.trigger();
    }
}

#[tokio::test]
async fn test_rate_limit_by_peer_address() {
    let (backend_addr, _) = backend(Router::new().route("/api/refine", post(refine_json))).await;
    let mut config = config_for(backend_addr);
    config.rate_limit.max_hits = 3;
    let (addr, shutdown) = common::start_site(config).await;
    let client = common::client();

    for i in 0..3 {
        let resp = client
            .get(format!("http://{}/api/status", addr))
            .header("x-forwarded-for", format!("10.9.9.{}", i + 1))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // The peer address wins over a spoofed forwarding header.
    let resp = client
        .get(format!("http://{}/api/status", addr))
        .header("x-forwarded-for", "10.9.9.250")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().get("content-security-policy").is_none());
    assert_eq!(resp.text().await.unwrap(), "Too many requests");

    // Assets stay reachable.
    let resp = client
        .get(format!("http://{}/robots.txt", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let (addr, shutdown) = common::start_site(SiteConfig::default()).await;
    let client = common::client();

    let resp = client
        .get(format!("http://{}/api/status", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let status: Value = resp.json().await.unwrap();
    assert_eq!(status["ok"], true);
    assert_eq!(status["maintenance"], false);

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(client
        .get(format!("http://{}/api/status", addr))
        .send()
        .await
        .is_err());
}
