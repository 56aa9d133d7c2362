use super::{CredentialBackend, CredentialMap};
use crate::error::NexusError;
use std::fs;
use std::io;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Credentials kept in one JSON document, rewritten in full on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Serialize `credentials` into a fresh temp file next to the target.
    ///
    /// Dropping the returned file without [`JsonFileStore::commit`] deletes it and
    /// leaves the target as it was.
    pub(crate) fn stage(&self, credentials: &CredentialMap) -> Result<NamedTempFile, NexusError> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir)?;
        let mut staged = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut staged, credentials)?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }

    /// Atomically rename a staged file over the target.
    pub(crate) fn commit(&self, staged: NamedTempFile) -> Result<(), NexusError> {
        staged
            .persist(&self.path)
            .map_err(|e| NexusError::Io(e.error))?;
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl CredentialBackend for JsonFileStore {
    fn load(&self) -> CredentialMap {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "credential file not found; starting empty");
                return CredentialMap::new();
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read credential file; treating as empty"
                );
                return CredentialMap::new();
            }
        };

        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(
                path = %self.path.display(),
                error = %e,
                "credential file is malformed; treating as empty"
            );
            CredentialMap::new()
        })
    }

    fn save(&self, credentials: &CredentialMap) -> Result<(), NexusError> {
        let staged = self.stage(credentials)?;
        self.commit(staged)?;
        debug!(path = %self.path.display(), users = credentials.len(), "credential file written");
        Ok(())
    }
}
