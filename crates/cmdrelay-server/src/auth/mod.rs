// Authentication module
// Decision: Single shared secret, optional and toggleable

pub mod api_key;
pub mod config;
pub mod middleware;

pub use config::AuthConfig;
pub use middleware::{AuthState, Authorized, SuppliedApiKey};
