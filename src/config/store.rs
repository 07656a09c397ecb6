//! Hot-reloadable credentials store.
//!
//! # Reload cycle
//! ```text
//! reload()
//!     → resolve credentials path
//!     → missing?            → keep current, Missing
//!     → mtime <= last read? → keep current, Unchanged
//!     → parse + validate
//!         → invalid         → keep current, Rejected
//!         → valid           → archive outgoing (best effort)
//!                           → atomic swap of Arc<CredentialsConfig>
//!                           → callbacks(old, new), Reloaded
//! ```
//!
//! Readers call [`CredentialsStore::current`] from any thread; it is a single
//! atomic load and never touches the file system. Reloads are serialized by
//! an internal mutex, so callbacks never run concurrently with each other or
//! with a later reload.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use arc_swap::ArcSwapOption;

use crate::config::archiver::ConfigArchiver;
use crate::config::loader::{load_credentials, ConfigError};
use crate::config::resolver::PathResolver;
use crate::config::schema::{CredentialsConfig, ExtensionConfig, PasswordType};
use crate::observability::metrics;

/// Subscriber invoked with `(old, new)` after a new record was promoted.
pub type ReloadCallback =
    Arc<dyn Fn(Option<&Arc<CredentialsConfig>>, &Arc<CredentialsConfig>) + Send + Sync>;

/// Result of a single reload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The credentials file does not exist.
    Missing,
    /// The file has not been modified since the last successful read.
    Unchanged,
    /// The file changed but could not be read or failed validation.
    Rejected,
    /// A new record was promoted and subscribers were notified.
    Reloaded,
}

impl ReloadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadOutcome::Missing => "missing",
            ReloadOutcome::Unchanged => "unchanged",
            ReloadOutcome::Rejected => "rejected",
            ReloadOutcome::Reloaded => "reloaded",
        }
    }
}

#[derive(Debug, Default)]
struct ReloadState {
    /// Modification time of the file at the last successful read.
    last_read: Option<SystemTime>,
}

/// Owner of the accepted credentials record.
pub struct CredentialsStore {
    current: ArcSwapOption<CredentialsConfig>,
    callbacks: RwLock<Vec<ReloadCallback>>,
    state: Mutex<ReloadState>,
    resolver: PathResolver,
    archiver: ConfigArchiver,
    password_type: PasswordType,
}

impl CredentialsStore {
    /// Create the store and read the credentials file once, synchronously.
    pub fn new(home: &Path, extension_config: &ExtensionConfig) -> Arc<Self> {
        let store = Arc::new(Self {
            current: ArcSwapOption::empty(),
            callbacks: RwLock::new(Vec::new()),
            state: Mutex::new(ReloadState::default()),
            resolver: PathResolver::credentials(home),
            archiver: ConfigArchiver::new(home),
            password_type: extension_config.password_type(),
        });

        let path = store.resolver.resolve();
        match store.read(&path) {
            Some((config, modified)) => {
                store.current.store(Some(Arc::new(config)));
                store.lock_state().last_read = Some(modified);
                tracing::info!(path = %path.display(), "Credentials configuration loaded");
            }
            None => {
                tracing::warn!(
                    path = %path.display(),
                    "No valid credentials configuration available, denying all connections"
                );
            }
        }

        store
    }

    /// The accepted record currently in effect.
    pub fn current(&self) -> Option<Arc<CredentialsConfig>> {
        self.current.load_full()
    }

    /// Register a callback for every future promotion.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(Option<&Arc<CredentialsConfig>>, &Arc<CredentialsConfig>) + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(callback));
    }

    /// Path the next reload will read.
    pub fn credentials_path(&self) -> PathBuf {
        self.resolver.resolve()
    }

    /// Run one poll cycle. Never fails; problems are logged.
    pub fn reload(&self) -> ReloadOutcome {
        let outcome = self.reload_inner();
        metrics::record_reload(outcome.as_str());
        outcome
    }

    fn reload_inner(&self) -> ReloadOutcome {
        let mut state = self.lock_state();
        let path = self.resolver.resolve();

        if !path.exists() {
            tracing::debug!(
                path = %path.display(),
                "No credentials file available, not reloading configuration for now"
            );
            return ReloadOutcome::Missing;
        }

        let modified = match modified_time(&path) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Unable to stat credentials file"
                );
                return ReloadOutcome::Rejected;
            }
        };

        let current = self.current.load_full();
        if current.is_some() && state.last_read.is_some_and(|last| modified <= last) {
            tracing::trace!(path = %path.display(), "No changes to credentials file");
            return ReloadOutcome::Unchanged;
        }

        tracing::debug!(path = %path.display(), "Credentials file changed, checking new file");
        let Some((config, modified)) = self.read(&path) else {
            return ReloadOutcome::Rejected;
        };

        tracing::info!("Credentials configuration changed, using new configuration");
        if let Err(e) = self.archiver.archive(current.as_deref()) {
            tracing::warn!(error = %e, "Archival of the old credentials configuration failed");
        }

        let new = Arc::new(config);
        self.current.store(Some(new.clone()));
        state.last_read = Some(modified);

        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for callback in callbacks {
            callback(current.as_ref(), &new);
        }

        ReloadOutcome::Reloaded
    }

    /// Parse and validate the file, logging every problem.
    fn read(&self, path: &Path) -> Option<(CredentialsConfig, SystemTime)> {
        let modified = match modified_time(path) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Unable to read credentials file"
                );
                return None;
            }
        };

        match load_credentials(path, self.password_type) {
            Ok(config) => Some((config, modified)),
            Err(ConfigError::Validation(errors)) => {
                let listing: String = errors.iter().map(|e| format!("\n\t- {}", e)).collect();
                tracing::warn!(
                    path = %path.display(),
                    "Credentials configuration has errors:{}",
                    listing
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Could not read credentials configuration file"
                );
                None
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ReloadState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolver::CREDENTIALS_LEGACY_LOCATION;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const VALID: &str = r#"
[[users]]
name = "user1"
password = "pass1"
roles = ["role1"]

[[roles]]
id = "role1"
[[roles.permissions]]
topic = "data/${{clientid}}/personal"
"#;

    const VALID_2: &str = r#"
[[users]]
name = "user2"
password = "pass2"
roles = ["role1"]

[[roles]]
id = "role1"
[[roles.permissions]]
topic = "${{username}}/#"
"#;

    fn plain() -> ExtensionConfig {
        ExtensionConfig {
            password_type: Some(PasswordType::Plain),
            ..ExtensionConfig::default()
        }
    }

    /// Write `content` and push the mtime forward so it is seen as newer.
    fn write(home: &Path, content: &str, offset_secs: u64) {
        let path = home.join(CREDENTIALS_LEGACY_LOCATION);
        fs::write(&path, content).unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
            .unwrap();
    }

    fn first_user(store: &CredentialsStore) -> String {
        store.current().unwrap().users()[0].name.clone().unwrap()
    }

    #[test]
    fn test_initial_load() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), VALID, 0);

        let store = CredentialsStore::new(home.path(), &plain());
        assert_eq!(first_user(&store), "user1");
    }

    #[test]
    fn test_missing_file() {
        let home = tempfile::tempdir().unwrap();
        let store = CredentialsStore::new(home.path(), &plain());

        assert!(store.current().is_none());
        assert_eq!(store.reload(), ReloadOutcome::Missing);
        assert!(store.current().is_none());
    }

    #[test]
    fn test_reload_is_idempotent() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), VALID, 0);
        let store = CredentialsStore::new(home.path(), &plain());

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        store.subscribe(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let before = store.current().unwrap();
        assert_eq!(store.reload(), ReloadOutcome::Unchanged);
        assert_eq!(store.reload(), ReloadOutcome::Unchanged);
        assert!(Arc::ptr_eq(&before, &store.current().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reload_promotes_and_notifies() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), VALID, 0);
        let store = CredentialsStore::new(home.path(), &plain());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        store.subscribe(move |old, new| {
            let old = old.map(|o| o.users()[0].name.clone().unwrap());
            let new = new.users()[0].name.clone().unwrap();
            s.lock().unwrap().push((old, new));
        });

        write(home.path(), VALID_2, 10);
        assert_eq!(store.reload(), ReloadOutcome::Reloaded);
        assert_eq!(first_user(&store), "user2");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Some("user1".to_string()), "user2".to_string())]
        );

        // second call: no change, no callback
        assert_eq!(store.reload(), ReloadOutcome::Unchanged);
        assert_eq!(seen.lock().unwrap().len(), 1);

        // the outgoing record was archived
        let archived = fs::read_dir(home.path().join("credentials-archive"))
            .unwrap()
            .count();
        assert_eq!(archived, 1);
    }

    #[test]
    fn test_invalid_replacement_keeps_current() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), VALID, 0);
        let store = CredentialsStore::new(home.path(), &plain());

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        store.subscribe(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        write(home.path(), "[[users]]\nname = \"x\"\n", 10);
        assert_eq!(store.reload(), ReloadOutcome::Rejected);
        assert_eq!(first_user(&store), "user1");

        // the read timestamp did not advance, the broken file is checked again
        assert_eq!(store.reload(), ReloadOutcome::Rejected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_late_valid_file_is_picked_up() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), "not = [valid", 0);
        let store = CredentialsStore::new(home.path(), &plain());
        assert!(store.current().is_none());

        write(home.path(), VALID, 0);
        assert_eq!(store.reload(), ReloadOutcome::Reloaded);
        assert_eq!(first_user(&store), "user1");

        // nothing to archive on the first promotion
        assert!(!home.path().join("credentials-archive").exists());
    }

    #[test]
    fn test_archive_failure_does_not_block_promotion() {
        let home = tempfile::tempdir().unwrap();
        write(home.path(), VALID, 0);
        let store = CredentialsStore::new(home.path(), &plain());

        // a directory where the archive file would go cannot be removed by remove_file
        let archive = home.path().join("credentials-archive");
        fs::create_dir_all(&archive).unwrap();
        let blocker = archive.join(format!(
            "{}-credentials.toml",
            chrono::Local::now().format("%Y%m%d-%H-%M-%S")
        ));
        fs::create_dir_all(&blocker).unwrap();

        write(home.path(), VALID_2, 10);
        assert_eq!(store.reload(), ReloadOutcome::Reloaded);
        assert_eq!(first_user(&store), "user2");
    }
}
