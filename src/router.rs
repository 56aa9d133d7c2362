use crate::api::SheetsApi;
use crate::config::Config;
use crate::error::NexusError;
use crate::google_oauth::GoogleOauth;
use crate::handlers::{
    google_oauth::{google_oauth_callback, google_oauth_entry},
    health::health_handler,
    mcp::mcp_handler,
};
use crate::mcp::Dispatcher;
use crate::service::CredentialResolver;
use crate::store::TokenStore;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

/// Shared handler state. The credential store is injected, never global.
#[derive(Clone)]
pub struct NexusState {
    pub config: Arc<Config>,
    pub store: TokenStore,
    pub oauth: GoogleOauth,
    pub dispatcher: Dispatcher,
}

impl NexusState {
    pub fn new(config: Config, store: TokenStore) -> Result<Self, NexusError> {
        let config = Arc::new(config);
        let client = build_http_client(&config)?;

        let oauth = GoogleOauth::new(&config, client.clone())?;
        let sheets = SheetsApi::new(client, config.sheets_api_base.clone());
        let resolver = CredentialResolver::new(store.clone(), oauth.clone());
        let dispatcher = Dispatcher::new(resolver, sheets, config.clone());

        Ok(Self {
            config,
            store,
            oauth,
            dispatcher,
        })
    }
}

pub fn nexus_router(state: NexusState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/auth/google", get(google_oauth_entry))
        .route("/auth/google/callback", get(google_oauth_callback))
        .route("/mcp", post(mcp_handler))
        .with_state(state)
}

/// One outbound client for both the token endpoint and the Sheets API.
///
/// Redirects are disabled as the OAuth2 token exchange requires.
fn build_http_client(cfg: &Config) -> Result<reqwest::Client, NexusError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("sheets-nexus/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(15))
        .redirect(reqwest::redirect::Policy::none());
    builder = match cfg.proxy.as_ref() {
        Some(proxy_url) => builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?),
        None => builder.no_proxy(),
    };
    Ok(builder.build()?)
}
