//! File RBAC service.
//!
//! Loads the extension configuration and the credentials file from the home
//! folder, keeps the credentials hot reloaded and exposes the connect-time
//! authenticator until a shutdown signal arrives.
//!
//! ```text
//!   <home>/conf/config.toml ──▶ ExtensionConfig
//!                                   │
//!   <home>/conf/credentials.toml ──▶ CredentialsStore ◀── ReloadTask (tick / nudge)
//!                                   │ (old, new)
//!                                   ▼
//!                           CredentialsValidator ──▶ FileAuthenticator
//! ```

use std::path::PathBuf;

use clap::Parser;

use file_rbac::auth::FileAuthenticator;
use file_rbac::config::watcher::{CredentialsWatcher, ReloadTask};
use file_rbac::config::{load_extension_config, CredentialsStore};
use file_rbac::lifecycle::{signals, Shutdown};
use file_rbac::observability::logging;
use file_rbac::CredentialsValidator;

#[derive(Parser)]
#[command(name = "file-rbac")]
#[command(about = "File based authentication and authorization for MQTT", long_about = None)]
struct Cli {
    /// Extension home folder containing the configuration files
    #[arg(long, default_value = ".")]
    home: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(logging::DEFAULT_FILTER);
    let cli = Cli::parse();

    tracing::info!(home = %cli.home.display(), "file-rbac v{} starting", env!("CARGO_PKG_VERSION"));

    let extension_config = load_extension_config(&cli.home);
    tracing::info!(
        reload_interval_secs = extension_config.reload_interval_secs(),
        password_type = ?extension_config.password_type(),
        next_extension_instead_of_fail = extension_config.next_extension_instead_of_fail,
        "Extension configuration loaded"
    );

    let store = CredentialsStore::new(&cli.home, &extension_config);
    let validator = CredentialsValidator::attach(&store, &extension_config);
    let _authenticator = FileAuthenticator::new(validator, &extension_config);

    let shutdown = Shutdown::new();
    let mut task = ReloadTask::new(store.clone(), extension_config.reload_interval_secs());

    // the watcher stops when its handle is dropped
    let mut _watcher = None;
    if extension_config.watch_file_events {
        let (watcher, nudges) = CredentialsWatcher::new(&store.credentials_path());
        match watcher.run() {
            Ok(handle) => {
                _watcher = Some(handle);
                task = task.with_nudges(nudges);
            }
            Err(e) => tracing::warn!(error = %e, "File watcher unavailable, relying on polling"),
        }
    }

    let reload = tokio::spawn(task.run(shutdown.subscribe()));

    signals::wait_for_shutdown().await;
    tracing::info!(tasks = shutdown.receiver_count(), "Shutting down");
    shutdown.trigger();

    if let Err(e) = reload.await {
        tracing::error!(error = %e, "Reload task ended abnormally");
    }
    Ok(())
}
