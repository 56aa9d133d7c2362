use crate::config::{Config, GOOGLE_SHEETS_SCOPE};
use crate::error::NexusError;

use chrono::{DateTime, TimeDelta, Utc};
use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, Scope, StandardRevocableToken,
    TokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenResponse,
    },
};
use tracing::info;
use url::Url;

/// Tokens handed back by the provider for a code exchange or a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl From<&BasicTokenResponse> for TokenGrant {
    fn from(token: &BasicTokenResponse) -> Self {
        let expiry = token
            .expires_in()
            .and_then(|d| TimeDelta::from_std(d).ok())
            .map(|d| Utc::now() + d);
        Self {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            expiry,
        }
    }
}

/// Google OAuth2 endpoints bound to this deployment's client identity.
#[derive(Clone)]
pub struct GoogleOauth {
    client: GoogleOauth2Client,
    http_client: reqwest::Client,
}

impl GoogleOauth {
    pub fn new(cfg: &Config, http_client: reqwest::Client) -> Result<Self, NexusError> {
        Ok(Self {
            client: build_oauth2_client(cfg)?,
            http_client,
        })
    }

    /// Consent URL carrying `user_id` as the round-trip state.
    ///
    /// Offline access plus forced consent makes Google issue a refresh token even when
    /// the user has authorized this client before.
    pub fn authorize_url(&self, user_id: &str) -> Url {
        let state = user_id.to_string();
        let (url, _state) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scope(Scope::new(GOOGLE_SHEETS_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();
        url
    }

    pub async fn exchange_code(&self, code: String) -> Result<TokenGrant, NexusError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http_client)
            .await?;
        info!(
            has_refresh_token = token.refresh_token().is_some(),
            "Authorization code exchanged successfully"
        );
        Ok(TokenGrant::from(&token))
    }

    /// Refresh the access token using a stored refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, NexusError> {
        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await?;
        info!("Access token refreshed successfully");
        Ok(TokenGrant::from(&token))
    }
}

/// Build the Google OAuth2 client from configuration.
fn build_oauth2_client(cfg: &Config) -> Result<GoogleOauth2Client, NexusError> {
    let client = OAuth2Client::new(ClientId::new(cfg.google_client_id.clone()))
        .set_client_secret(ClientSecret::new(cfg.google_client_secret.clone()))
        .set_auth_uri(AuthUrl::from_url(cfg.google_auth_url.clone()))
        .set_token_uri(TokenUrl::from_url(cfg.google_token_url.clone()))
        .set_redirect_uri(RedirectUrl::from_url(cfg.redirect_url()?));
    Ok(client)
}

type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;
