// Command Relay HTTP server
//
// Exposes the relay core over HTTP: submit and poll endpoints guarded by an
// optional shared secret, plus status, user listing and service metadata.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod openapi;
pub mod pruner;

pub use app::{build_app, build_router_with_prefix};
pub use config::ServerConfig;
