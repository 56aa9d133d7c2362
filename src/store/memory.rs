use super::{CredentialBackend, CredentialMap};
use crate::error::NexusError;
use parking_lot::RwLock;

/// Volatile backend; a save swaps the whole mapping at once.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: RwLock<CredentialMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: CredentialMap) -> Self {
        Self {
            credentials: RwLock::new(credentials),
        }
    }
}

impl CredentialBackend for MemoryStore {
    fn load(&self) -> CredentialMap {
        self.credentials.read().clone()
    }

    fn save(&self, credentials: &CredentialMap) -> Result<(), NexusError> {
        *self.credentials.write() = credentials.clone();
        Ok(())
    }
}
