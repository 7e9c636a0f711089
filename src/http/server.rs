//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (edge gate, tracing, request ID, limits, timeout)
//! - Serve static assets and pages
//! - Apply reloaded configuration to request handlers
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::SiteConfig;
use crate::http::middleware::{edge_gate_middleware, track_metrics};
use crate::http::{checkout, refine, site};
use crate::lifecycle::Shutdown;
use crate::security::rate_limit::spawn_sweeper;
use crate::security::EdgeGate;
use crate::upstream::{BackendClient, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live configuration; swapped on reload.
    pub config: Arc<ArcSwap<SiteConfig>>,
    pub backend: BackendClient,
    pub gate: Arc<EdgeGate>,
}

impl AppState {
    /// Snapshot of the current configuration.
    pub fn settings(&self) -> Arc<SiteConfig> {
        self.config.load_full()
    }
}

/// HTTP server for the site.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server with a fresh edge gate on the system clock.
    pub fn new(config: SiteConfig) -> Result<Self, UpstreamError> {
        let gate = Arc::new(EdgeGate::from_config(&config));
        Self::with_gate(config, gate)
    }

    /// Create a server around an existing gate.
    pub fn with_gate(config: SiteConfig, gate: Arc<EdgeGate>) -> Result<Self, UpstreamError> {
        let backend = BackendClient::new(Duration::from_secs(config.timeouts.upstream_secs))?;
        let state = AppState {
            config: Arc::new(ArcSwap::from_pointee(config.clone())),
            backend,
            gate,
        };
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The edge gate wraps the timeout and body limits, so oversized or slow
    /// requests are still counted and their 413/408 carries the headers.
    fn build_router(config: &SiteConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/api/refine", post(refine::refine))
            .route("/api/create-checkout-session", post(checkout::create_checkout_session))
            .route("/api/status", get(site::status))
            .route("/sitemap.xml", get(site::sitemap_xml))
            .route("/robots.txt", get(site::robots_txt))
            .fallback(site::page);

        if let Some(dir) = &config.site.static_dir {
            tracing::info!(prefix = %config.site.static_prefix, dir = %dir, "Serving static assets");
            router = router.nest_service(&config.site.static_prefix, ServeDir::new(dir));
        }

        router
            .with_state(state.clone())
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(middleware::from_fn_with_state(state.gate.clone(), edge_gate_middleware))
            .layer(middleware::from_fn(track_metrics))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates received on `config_updates` are applied to
    /// request handlers. Returns once `shutdown` fires and in-flight requests
    /// have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<SiteConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let initial = self.state.settings();
        if initial.rate_limit.enabled && initial.rate_limit.sweep_interval_secs > 0 {
            spawn_sweeper(
                self.state.gate.limiter().clone(),
                Duration::from_secs(initial.rate_limit.sweep_interval_secs),
                shutdown.resubscribe(),
            );
        }

        tokio::spawn(apply_config_updates(
            self.state.config.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(Shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap reloaded configuration into the live state.
///
/// Only backend and site settings take effect; gate policy, listener and
/// limits are fixed for the life of the process.
async fn apply_config_updates(
    live: Arc<ArcSwap<SiteConfig>>,
    mut updates: mpsc::UnboundedReceiver<SiteConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(new_config) = update else { break };
                let current = live.load();
                if requires_restart(&current, &new_config) {
                    tracing::warn!("Gate, listener or limit settings changed; restart to apply them");
                }
                tracing::info!(
                    api_url = %new_config.backend.api_url,
                    site_url = %new_config.site.base_url,
                    maintenance = new_config.site.maintenance,
                    "Configuration reloaded"
                );
                live.store(Arc::new(new_config));
            }
            _ = shutdown.recv() => break,
        }
    }
}

fn requires_restart(current: &SiteConfig, new: &SiteConfig) -> bool {
    current.listener != new.listener
        || current.rate_limit != new.rate_limit
        || current.client_ip != new.client_ip
        || current.gate != new.gate
        || current.security.production != new.security.production
        || current.security.max_body_size != new.security.max_body_size
        || current.timeouts != new.timeouts
        || current.site.static_dir != new.site.static_dir
        || current.site.static_prefix != new.site.static_prefix
        || current.observability != new.observability
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_restart() {
        let current = SiteConfig::default();

        let mut new = current.clone();
        new.site.maintenance = true;
        new.backend.api_url = "https://other.example.com".into();
        assert!(!requires_restart(&current, &new));

        let mut new = current.clone();
        new.rate_limit.max_hits = 10;
        assert!(requires_restart(&current, &new));
    }

    #[tokio::test]
    async fn test_updates_are_swapped_in() {
        let live = Arc::new(ArcSwap::from_pointee(SiteConfig::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(apply_config_updates(live.clone(), rx, shutdown_rx));

        let mut new = SiteConfig::default();
        new.site.maintenance = true;
        tx.send(new).unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(live.load().site.maintenance);
    }
}
