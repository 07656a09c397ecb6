//! Periodic reload driver and optional file watcher.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::store::{CredentialsStore, ReloadOutcome};

/// Drives [`CredentialsStore::reload`] on a fixed delay.
///
/// Each reload runs on the blocking pool and is awaited before the next tick,
/// so two reloads never overlap.
pub struct ReloadTask {
    store: Arc<CredentialsStore>,
    interval: Duration,
    nudges: Option<mpsc::UnboundedReceiver<()>>,
}

impl ReloadTask {
    pub fn new(store: Arc<CredentialsStore>, interval_secs: u64) -> Self {
        Self {
            store,
            interval: Duration::from_secs(interval_secs.max(1)),
            nudges: None,
        }
    }

    /// Also reload whenever a nudge arrives on `nudges`.
    pub fn with_nudges(mut self, nudges: mpsc::UnboundedReceiver<()>) -> Self {
        self.nudges = Some(nudges);
        self
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Credentials reload task starting"
        );

        // first check one interval after startup, the store already read the file
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut nudges = self.nudges.take();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reload_once().await;
                }
                Some(()) = recv_nudge(&mut nudges) => {
                    self.reload_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!(
                        "Credentials reload task received shutdown signal, exiting loop"
                    );
                    break;
                }
            }
        }
    }

    async fn reload_once(&self) -> Option<ReloadOutcome> {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.reload()).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(error = %e, "Credentials reload task panicked");
                None
            }
        }
    }
}

async fn recv_nudge(nudges: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match nudges {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Watches the folder of the credentials file and nudges the reload task.
pub struct CredentialsWatcher {
    path: PathBuf,
    nudge_tx: mpsc::UnboundedSender<()>,
}

impl CredentialsWatcher {
    /// Create a new watcher for `path`.
    ///
    /// Returns the watcher and the receiver to hand to [`ReloadTask::with_nudges`].
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (nudge_tx, nudge_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                nudge_tx,
            },
            nudge_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.nudge_tx.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        // the file itself may not exist yet
        let folder = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_file && (event.kind.is_modify() || event.kind.is_create()) {
                        tracing::debug!("Credentials file change detected, nudging reload");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&folder, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Credentials watcher started");
        Ok(watcher)
    }
}
