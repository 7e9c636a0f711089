//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcasts a single shutdown event to the server, the config reload task
/// and the rate limit sweeper.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Safe to call more than once.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Resolves once [`Shutdown::trigger`] has been called.
    pub async fn wait(mut rx: broadcast::Receiver<()>) {
        // A lagged or closed channel also means shutdown.
        let _ = rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
