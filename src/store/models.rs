use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted OAuth material for a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCredential {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Ordered so the file on disk is stable between rewrites.
pub type CredentialMap = BTreeMap<String, StoredCredential>;

impl StoredCredential {
    /// Build the record that replaces `previous`.
    ///
    /// The access token and expiry always come from the new grant. A grant without a
    /// refresh token keeps the one already on file.
    pub fn merged(
        previous: Option<&StoredCredential>,
        access_token: String,
        refresh_token: Option<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Self {
        let refresh_token =
            refresh_token.or_else(|| previous.and_then(|p| p.refresh_token.clone()));
        Self {
            access_token,
            refresh_token,
            expiry,
        }
    }
}
