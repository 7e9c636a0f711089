//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::SiteConfig;

/// Watches the configuration file and emits every successfully validated
/// configuration that differs from the last one emitted.
pub struct ConfigWatcher {
    path: PathBuf,
    current: SiteConfig,
    update_tx: mpsc::UnboundedSender<SiteConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, seeded with the configuration already in use.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path, current: SiteConfig) -> (Self, mpsc::UnboundedReceiver<SiteConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let last = Mutex::new(self.current);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(new_config) => {
                            let mut last = match last.lock() {
                                Ok(guard) => guard,
                                Err(poisoned) => poisoned.into_inner(),
                            };
                            if *last == new_config {
                                tracing::debug!("Config file touched without changes");
                                return;
                            }
                            *last = new_config.clone();
                            tracing::info!("Config file change detected, reloading");
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
