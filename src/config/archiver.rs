//! Archival of superseded credentials documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::config::loader::{write_credentials, ConfigError};
use crate::config::schema::CredentialsConfig;

pub const ARCHIVE_FOLDER: &str = "credentials-archive";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Could not delete file {}", .0.display())]
    Delete(PathBuf, #[source] std::io::Error),

    #[error("Could not create credentials archive folder {}", .0.display())]
    CreateFolder(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Write(#[from] ConfigError),
}

/// Writes outgoing credentials documents to `<home>/credentials-archive`.
#[derive(Debug)]
pub struct ConfigArchiver {
    folder: PathBuf,
    lock: Mutex<()>,
}

impl ConfigArchiver {
    pub fn new(home: &Path) -> Self {
        Self {
            folder: home.join(ARCHIVE_FOLDER),
            lock: Mutex::new(()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Archive `config` to a new timestamped file.
    ///
    /// Returns the written path, or `None` when there was nothing to archive.
    pub fn archive(
        &self,
        config: Option<&CredentialsConfig>,
    ) -> Result<Option<PathBuf>, ArchiveError> {
        let Some(config) = config else {
            tracing::debug!("No previous credentials configuration, nothing to archive");
            return Ok(None);
        };

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if self.folder.is_file() {
            tracing::warn!(
                path = %self.folder.display(),
                "The credentials archive folder is a file, trying to delete"
            );
            fs::remove_file(&self.folder)
                .map_err(|e| ArchiveError::Delete(self.folder.clone(), e))?;
        }

        if !self.folder.exists() {
            fs::create_dir_all(&self.folder)
                .map_err(|e| ArchiveError::CreateFolder(self.folder.clone(), e))?;
            tracing::info!(path = %self.folder.display(), "Created credentials archive folder");
        }

        let file_name = format!(
            "{}-credentials.toml",
            chrono::Local::now().format("%Y%m%d-%H-%M-%S")
        );
        let path = self.folder.join(file_name);
        write_credentials(config, &path)?;

        tracing::info!(path = %path.display(), "Archived credentials configuration");
        Ok(Some(path))
    }
}
