//! Credential persistence: the user id -> OAuth token pair mapping.
//!
//! Layout:
//! - `models.rs`: the persisted record and the merge rule applied on every upsert
//! - `file.rs`: single JSON file backend, replaced wholesale via temp file + rename
//! - `memory.rs`: in-process backend with the same contract, used by tests
//! - `token_store.rs`: shared handle that serialises read-modify-write cycles

pub mod file;
pub mod memory;
pub mod models;
pub mod token_store;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use models::{CredentialMap, StoredCredential};
pub use token_store::TokenStore;

use crate::error::NexusError;

/// Whole-mapping load/save contract every credential backend honours.
///
/// `load` never fails: a missing or unreadable backing store is an empty mapping.
/// `save` must never leave a partially written mapping observable by `load`.
pub trait CredentialBackend: Send + Sync {
    fn load(&self) -> CredentialMap;
    fn save(&self, credentials: &CredentialMap) -> Result<(), NexusError>;
}
