//! Per-client-IP fixed-window rate limiting.
//!
//! Each client IP owns one [`ClientHitRecord`]. The first request of a window
//! starts it with `count = 1`; later requests inside the window increment the
//! count and are admitted while it stays within the budget. A request arriving
//! more than one window after `window_start` replaces the record.
//!
//! Records are never removed on the request path. Idle IPs linger until the
//! optional sweeper (see [`spawn_sweeper`]) drops records whose window has
//! expired. Enforcement is per process: nothing is shared across instances
//! and nothing survives a restart.

use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::clock::{Clock, SystemClock};

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Deny,
}

impl Decision {
    pub fn is_admit(self) -> bool {
        matches!(self, Decision::Admit)
    }
}

/// Per-client counter for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHitRecord {
    /// Requests seen since `window_start`, denied ones included.
    pub count: u32,
    pub window_start: Instant,
}

impl ClientHitRecord {
    fn start(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }
}

/// Process-wide map from client IP to its hit record.
#[derive(Debug, Default)]
pub struct HitRegistry {
    records: DashMap<String, ClientHitRecord>,
}

impl HitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ip: &str) -> Option<ClientHitRecord> {
        self.records.get(ip).map(|r| *r.value())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fixed-window limiter over a [`HitRegistry`].
pub struct FixedWindowLimiter {
    registry: Arc<HitRegistry>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max_hits: u32,
}

impl FixedWindowLimiter {
    /// Limiter on the system clock with a fresh registry.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(
            Duration::from_millis(config.window_ms),
            config.max_hits,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(window: Duration, max_hits: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: Arc::new(HitRegistry::new()),
            clock,
            window,
            max_hits,
        }
    }

    pub fn registry(&self) -> &Arc<HitRegistry> {
        &self.registry
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_hits(&self) -> u32 {
        self.max_hits
    }

    /// Count one request from `ip` and decide whether it fits the budget.
    ///
    /// The entry guard holds the shard lock for the whole read-check-increment,
    /// so concurrent requests from one IP never lose an update.
    pub fn check(&self, ip: &str) -> Decision {
        let now = self.clock.now();

        match self.registry.records.entry(ip.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(ClientHitRecord::start(now));
                metrics::record_registry_size(self.registry.len());
                Decision::Admit
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if now.saturating_duration_since(record.window_start) > self.window {
                    *record = ClientHitRecord::start(now);
                    return Decision::Admit;
                }

                record.count = record.count.saturating_add(1);
                if record.count <= self.max_hits {
                    Decision::Admit
                } else {
                    Decision::Deny
                }
            }
        }
    }

    /// Drop records whose window has expired. Returns how many were removed.
    ///
    /// A dropped record would have been replaced on the IP's next request
    /// anyway, so sweeping never changes a decision.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.registry.len();
        self.registry
            .records
            .retain(|_, record| now.saturating_duration_since(record.window_start) <= self.window);
        let after = self.registry.len();
        metrics::record_registry_size(after);
        before.saturating_sub(after)
    }
}

/// Run [`FixedWindowLimiter::sweep`] every `interval` until shutdown.
pub fn spawn_sweeper(
    limiter: Arc<FixedWindowLimiter>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = limiter.registry().len(), "Swept expired rate limit records");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
