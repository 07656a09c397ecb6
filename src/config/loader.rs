//! Configuration loading from and writing to disk.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{CredentialsConfig, ExtensionConfig, PasswordType};
use crate::config::validation::validate_credentials;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("File {} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Could not write config to file {} because it's a directory", .0.display())]
    IsDirectory(PathBuf),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

/// Parse a credentials document without validating it.
pub fn read_credentials(path: &Path) -> Result<CredentialsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: CredentialsConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Write a credentials document to a file that must not exist yet.
pub fn write_credentials(config: &CredentialsConfig, path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        return Err(ConfigError::IsDirectory(path.to_path_buf()));
    }
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let content = toml::to_string_pretty(config)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => ConfigError::AlreadyExists(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

/// Load and validate a credentials document.
pub fn load_credentials(
    path: &Path,
    password_type: PasswordType,
) -> Result<CredentialsConfig, ConfigError> {
    let config = read_credentials(path)?;

    let result = validate_credentials(password_type, &config);
    if !result.is_valid() {
        return Err(ConfigError::Validation(result.errors));
    }

    Ok(config)
}

/// Parse an extension configuration file.
pub fn read_extension_config(path: &Path) -> Result<ExtensionConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ExtensionConfig = toml::from_str(&content)?;
    Ok(config)
}
