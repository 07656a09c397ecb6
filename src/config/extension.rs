//! Extension configuration with fallback to defaults.

use std::path::Path;

use crate::config::loader::read_extension_config;
use crate::config::resolver::PathResolver;
use crate::config::schema::{ExtensionConfig, DEFAULT_RELOAD_INTERVAL_SECS};

/// Read the extension configuration from the home folder.
///
/// Never fails: a missing, unreadable or unparseable file yields the defaults,
/// and out-of-range values are replaced by their default.
pub fn load_extension_config(home: &Path) -> ExtensionConfig {
    let path = PathResolver::extension_config(home).resolve();

    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "Extension configuration file missing, using defaults"
        );
        return ExtensionConfig::default();
    }

    let mut config = match read_extension_config(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not read extension configuration file, using defaults"
            );
            return ExtensionConfig::default();
        }
    };

    if config.reload_interval_secs < 1 {
        tracing::warn!(
            interval = config.reload_interval_secs,
            default = DEFAULT_RELOAD_INTERVAL_SECS,
            "Credentials reload interval must be greater than 0, using default interval"
        );
        config.reload_interval_secs = DEFAULT_RELOAD_INTERVAL_SECS as i64;
    }
    if config.password_type.is_none() {
        tracing::warn!("Unknown password type, using default type HASHED");
        config.password_type = Some(Default::default());
    }

    tracing::debug!(?config, "Extension configuration loaded");
    config
}
