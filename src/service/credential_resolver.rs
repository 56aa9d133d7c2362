use crate::error::NexusError;
use crate::google_oauth::{GoogleCredential, GoogleOauth};
use crate::store::TokenStore;
use std::future::Future;
use tracing::{debug, info, warn};

/// Outcome of acting on a user's behalf.
///
/// `AuthRequired` is a normal result, not an error: the user has no usable credential
/// and must go through the consent flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T = GoogleCredential> {
    AuthRequired,
    Ready(T),
}

impl<T> Resolution<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::AuthRequired => Resolution::AuthRequired,
            Resolution::Ready(v) => Resolution::Ready(f(v)),
        }
    }
}

/// Turns stored records into live credentials and keeps them fresh.
#[derive(Clone)]
pub struct CredentialResolver {
    store: TokenStore,
    oauth: GoogleOauth,
}

impl CredentialResolver {
    pub fn new(store: TokenStore, oauth: GoogleOauth) -> Self {
        Self { store, oauth }
    }

    /// Look up `user_id`; a credential known to be expired is refreshed first.
    pub async fn resolve(&self, user_id: &str) -> Result<Resolution, NexusError> {
        let Some(stored) = self.store.get(user_id) else {
            debug!(user_id, "no credential on file");
            return Ok(Resolution::AuthRequired);
        };
        let credential = GoogleCredential::from_stored(user_id, stored);
        if credential.is_expired() && credential.can_refresh() {
            debug!(user_id, "stored access token expired; refreshing before use");
            return self.refresh(credential).await;
        }
        Ok(Resolution::Ready(credential))
    }

    /// Exchange the refresh token for a new access token and write it back.
    ///
    /// No refresh token on file, or a grant the provider reports as `invalid_grant`,
    /// resolves to `AuthRequired`. Any other refusal is returned as an error.
    pub async fn refresh(&self, mut credential: GoogleCredential) -> Result<Resolution, NexusError> {
        let Some(refresh_token) = credential.refresh_token.clone() else {
            warn!(user_id = %credential.user_id, "no refresh token on file; re-authorization required");
            return Ok(Resolution::AuthRequired);
        };

        let grant = match self.oauth.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(e) if e.requires_reauthorization() => {
                warn!(user_id = %credential.user_id, error = %e, "refresh rejected; re-authorization required");
                return Ok(Resolution::AuthRequired);
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self
            .store
            .upsert(
                &credential.user_id,
                grant.access_token.clone(),
                grant.refresh_token.clone(),
                grant.expiry,
            )
            .await
        {
            warn!(user_id = %credential.user_id, error = %e, "failed to persist refreshed token");
        }
        credential.apply(grant);
        info!(user_id = %credential.user_id, "credential refreshed");
        Ok(Resolution::Ready(credential))
    }

    /// Run `op` with `user_id`'s access token.
    ///
    /// An upstream 401 triggers one refresh and one more attempt with the new token.
    /// Every other failure is returned as-is.
    pub async fn run_as<T, F, Fut>(&self, user_id: &str, op: F) -> Result<Resolution<T>, NexusError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, NexusError>>,
    {
        let credential = match self.resolve(user_id).await? {
            Resolution::Ready(credential) => credential,
            Resolution::AuthRequired => return Ok(Resolution::AuthRequired),
        };

        match op(credential.access_token.clone()).await {
            Err(e) if e.is_upstream_unauthorized() => {
                info!(user_id, "access token rejected upstream; refreshing");
                match self.refresh(credential).await? {
                    Resolution::Ready(fresh) => op(fresh.access_token).await.map(Resolution::Ready),
                    Resolution::AuthRequired => Ok(Resolution::AuthRequired),
                }
            }
            other => other.map(Resolution::Ready),
        }
    }
}
