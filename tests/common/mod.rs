//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use kaltrium_web::config::SiteConfig;
use kaltrium_web::security::client_ip::ClientIpResolver;
use kaltrium_web::security::clock::ManualClock;
use kaltrium_web::security::headers::SecurityHeaders;
use kaltrium_web::routing::GateScope;
use kaltrium_web::{EdgeGate, HttpServer, Shutdown};
use kaltrium_web::security::FixedWindowLimiter;

/// Serve `router` on an ephemeral port as a stand-in backend.
#[allow(dead_code)]
pub async fn start_mock_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Gate on a manual clock, built from `config`.
#[allow(dead_code)]
pub fn manual_gate(config: &SiteConfig) -> (Arc<EdgeGate>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let limiter = FixedWindowLimiter::with_clock(
        Duration::from_millis(config.rate_limit.window_ms),
        config.rate_limit.max_hits,
        clock.clone(),
    );
    let gate = EdgeGate::new(
        GateScope::from_config(&config.gate),
        ClientIpResolver::new(&config.client_ip),
        Arc::new(limiter),
        SecurityHeaders::new(config.security.production),
    );
    (Arc::new(gate), clock)
}

/// Start the site server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_site(mut config: SiteConfig) -> (SocketAddr, Shutdown) {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    (addr, shutdown)
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
