use super::{CredentialBackend, CredentialMap, StoredCredential};
use crate::error::NexusError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Cloneable handle over a credential backend.
///
/// Reads go straight to the backend. Upserts hold `write_lock` across the whole
/// load-merge-save cycle so concurrent writers never drop each other's records.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn CredentialBackend>,
    write_lock: Arc<Mutex<()>>,
}

impl TokenStore {
    pub fn new<B>(backend: B) -> Self
    where
        B: CredentialBackend + 'static,
    {
        Self {
            backend: Arc::new(backend),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn load(&self) -> CredentialMap {
        self.backend.load()
    }

    pub fn get(&self, user_id: &str) -> Option<StoredCredential> {
        self.backend.load().remove(user_id)
    }

    /// Insert or update one user's tokens, preserving a known refresh token when the
    /// new grant carries none. Returns the record as persisted.
    pub async fn upsert(
        &self,
        user_id: &str,
        access_token: String,
        refresh_token: Option<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<StoredCredential, NexusError> {
        let _guard = self.write_lock.lock().await;

        let mut credentials = self.backend.load();
        let record = StoredCredential::merged(
            credentials.get(user_id),
            access_token,
            refresh_token,
            expiry,
        );
        credentials.insert(user_id.to_string(), record.clone());
        self.backend.save(&credentials)?;

        info!(
            user_id,
            has_refresh_token = record.refresh_token.is_some(),
            "credential stored"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonFileStore, MemoryStore};

    #[tokio::test]
    async fn upsert_without_refresh_token_keeps_existing_one() {
        let store = TokenStore::new(MemoryStore::new());
        store
            .upsert("u", "t".into(), Some("r".into()), None)
            .await
            .unwrap();

        for _ in 0..3 {
            store.upsert("u", "t".into(), None, None).await.unwrap();
        }

        let rec = store.get("u").unwrap();
        assert_eq!(rec.access_token, "t");
        assert_eq!(rec.refresh_token.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn upsert_replaces_access_token() {
        let store = TokenStore::new(MemoryStore::new());
        store
            .upsert("u", "first".into(), Some("r".into()), None)
            .await
            .unwrap();
        store.upsert("u", "second".into(), None, None).await.unwrap();
        assert_eq!(store.get("u").unwrap().access_token, "second");
    }

    #[tokio::test]
    async fn first_grant_without_refresh_token_is_stored_as_none() {
        let store = TokenStore::new(MemoryStore::new());
        let rec = store.upsert("u", "t".into(), None, None).await.unwrap();
        assert!(rec.refresh_token.is_none());
        assert!(store.get("other").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_for_different_users_all_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(JsonFileStore::new(dir.path().join("tokens.json")));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert(&format!("user-{i}"), format!("tok-{i}"), None, None)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let all = store.load();
        assert_eq!(all.len(), 16);
        assert_eq!(all["user-7"].access_token, "tok-7");
    }
}
