//! Location of configuration files inside the extension home folder.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub const EXTENSION_CONFIG_LOCATION: &str = "conf/config.toml";
pub const EXTENSION_CONFIG_LEGACY_LOCATION: &str = "extension-config.toml";
pub const CREDENTIALS_LOCATION: &str = "conf/credentials.toml";
pub const CREDENTIALS_LEGACY_LOCATION: &str = "credentials.toml";

/// Resolves a file that may live at a current or a legacy location.
///
/// The current location wins whenever it exists. The legacy location is used
/// only when it is the one present, and a warning is logged the first time.
#[derive(Debug)]
pub struct PathResolver {
    location: PathBuf,
    legacy_location: PathBuf,
    legacy_warning_logged: AtomicBool,
}

impl PathResolver {
    pub fn new(home: &Path, location: &str, legacy_location: &str) -> Self {
        Self {
            location: home.join(location),
            legacy_location: home.join(legacy_location),
            legacy_warning_logged: AtomicBool::new(false),
        }
    }

    pub fn credentials(home: &Path) -> Self {
        Self::new(home, CREDENTIALS_LOCATION, CREDENTIALS_LEGACY_LOCATION)
    }

    pub fn extension_config(home: &Path) -> Self {
        Self::new(home, EXTENSION_CONFIG_LOCATION, EXTENSION_CONFIG_LEGACY_LOCATION)
    }

    /// The path to read right now.
    pub fn resolve(&self) -> PathBuf {
        if self.location.exists() || !self.legacy_location.exists() {
            return self.location.clone();
        }

        if !self.legacy_warning_logged.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                legacy = %self.legacy_location.display(),
                location = %self.location.display(),
                "File is placed at the legacy location, please move it. \
                 Support for the legacy location will be removed in a future release"
            );
        }
        self.legacy_location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolution_order() {
        let home = tempfile::tempdir().unwrap();
        let resolver = PathResolver::credentials(home.path());
        let current = home.path().join(CREDENTIALS_LOCATION);
        let legacy = home.path().join(CREDENTIALS_LEGACY_LOCATION);

        // neither present
        assert_eq!(resolver.resolve(), current);

        fs::write(&legacy, "").unwrap();
        assert_eq!(resolver.resolve(), legacy);

        fs::create_dir_all(current.parent().unwrap()).unwrap();
        fs::write(&current, "").unwrap();
        assert_eq!(resolver.resolve(), current);
    }
}
