use crate::error::NexusError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

/// User id assumed when a tool call carries no `meta.user_id`.
pub const DEFAULT_USER_ID: &str = "default";

pub const SERVER_NAME: &str = "Multi-User Google Sheets MCP";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

pub const GOOGLE_SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

pub static GOOGLE_AUTH_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://accounts.google.com/o/oauth2/auth").expect("invalid GOOGLE_AUTH_URL")
});

pub static GOOGLE_TOKEN_URI: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://oauth2.googleapis.com/token").expect("invalid GOOGLE_TOKEN_URI")
});

pub static GOOGLE_SHEETS_API: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://sheets.googleapis.com/v4/spreadsheets").expect("invalid GOOGLE_SHEETS_API")
});

/// Process-wide configuration, resolved once from defaults and the environment.
pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: failed to load configuration"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Externally reachable base URL; callback and recovery links are built from it.
    pub base_url: Url,
    pub listen_addr: String,
    pub token_file: PathBuf,
    pub loglevel: String,
    pub proxy: Option<Url>,
    pub google_auth_url: Url,
    pub google_token_url: Url,
    pub sheets_api_base: Url,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_client_id: String::new(),
            google_client_secret: String::new(),
            base_url: Url::parse("http://localhost:8000").expect("invalid default base_url"),
            listen_addr: "0.0.0.0:8000".to_string(),
            token_file: PathBuf::from("tokens.json"),
            loglevel: "info".to_string(),
            proxy: None,
            google_auth_url: GOOGLE_AUTH_URL.clone(),
            google_token_url: GOOGLE_TOKEN_URI.clone(),
            sheets_api_base: GOOGLE_SHEETS_API.clone(),
        }
    }
}

impl Config {
    /// Defaults, then the bare `GOOGLE_CLIENT_ID`/`GOOGLE_CLIENT_SECRET`/`BASE_URL`
    /// variables, then anything prefixed with `SHEETS_NEXUS_`.
    pub fn load() -> Result<Self, NexusError> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET", "BASE_URL"]))
            .merge(Env::prefixed("SHEETS_NEXUS_"))
            .extract()
            .map_err(|e| NexusError::Config(e.to_string()))
    }

    /// Where the identity provider sends the user back after consent.
    pub fn redirect_url(&self) -> Result<Url, NexusError> {
        Ok(Url::parse(&format!("{}/auth/google/callback", self.base_trimmed()))?)
    }

    /// Self-service link that starts the consent flow for `user_id`.
    pub fn auth_entry_url(&self, user_id: &str) -> Result<Url, NexusError> {
        let mut url = Url::parse(&format!("{}/auth/google", self.base_trimmed()))?;
        url.query_pairs_mut().append_pair("user_id", user_id);
        Ok(url)
    }

    fn base_trimmed(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}
