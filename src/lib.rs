pub mod api;
pub mod config;
pub mod error;
pub mod google_oauth;
pub mod handlers;
pub mod mcp;
pub mod router;
pub mod service;
pub mod store;
pub mod types;

pub use error::NexusError;
pub use google_oauth::credentials::GoogleCredential;
pub use google_oauth::endpoints::GoogleOauth;
pub use store::TokenStore;
