use crate::google_oauth::endpoints::TokenGrant;
use crate::store::StoredCredential;
use chrono::{DateTime, TimeDelta, Utc};

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Live credential for one user, seeded from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleCredential {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl GoogleCredential {
    pub fn from_stored(user_id: impl Into<String>, stored: StoredCredential) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expiry: stored.expiry,
        }
    }

    /// Unknown expiry counts as valid; the upstream 401 path covers that case.
    pub fn is_expired(&self) -> bool {
        self.expiry
            .is_some_and(|expiry| Utc::now() + TimeDelta::seconds(EXPIRY_SKEW_SECS) >= expiry)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Fold a refresh grant in; a grant without a rotated refresh token keeps ours.
    pub fn apply(&mut self, grant: TokenGrant) {
        self.access_token = grant.access_token;
        if let Some(rotated) = grant.refresh_token {
            self.refresh_token = Some(rotated);
        }
        self.expiry = grant.expiry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expiry: Option<DateTime<Utc>>) -> GoogleCredential {
        GoogleCredential {
            user_id: "u".into(),
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            expiry,
        }
    }

    #[test]
    fn expiry_checks() {
        assert!(!credential(None).is_expired());
        assert!(credential(Some(Utc::now() - TimeDelta::minutes(5))).is_expired());
        assert!(credential(Some(Utc::now() + TimeDelta::seconds(30))).is_expired());
        assert!(!credential(Some(Utc::now() + TimeDelta::hours(1))).is_expired());
    }

    #[test]
    fn apply_keeps_refresh_token_unless_rotated() {
        let mut cred = credential(None);
        cred.apply(TokenGrant {
            access_token: "a2".into(),
            refresh_token: None,
            expiry: None,
        });
        assert_eq!(cred.access_token, "a2");
        assert_eq!(cred.refresh_token.as_deref(), Some("r"));

        cred.apply(TokenGrant {
            access_token: "a3".into(),
            refresh_token: Some("r2".into()),
            expiry: None,
        });
        assert_eq!(cred.refresh_token.as_deref(), Some("r2"));
    }
}
