pub mod credentials;
pub mod endpoints;

pub use credentials::GoogleCredential;
pub use endpoints::{GoogleOauth, TokenGrant};
