// HTTP API routes
//
// This module contains all HTTP route handlers for the public API.
// Every submodule builds its router from the shared RelayState.

pub mod commands;
pub mod common;
pub mod root;
pub mod status;
pub mod users;
pub mod validation;

use axum::extract::FromRef;
use cmdrelay_core::CommandRelay;
use std::sync::Arc;

use crate::auth::AuthState;

// Re-export common types
pub use common::{ApiError, ErrorResponse};

/// App state shared across routes
#[derive(Clone)]
pub struct RelayState {
    pub relay: Arc<CommandRelay>,
    pub auth: AuthState,
}

impl RelayState {
    pub fn new(relay: Arc<CommandRelay>, auth: AuthState) -> Self {
        Self { relay, auth }
    }
}

impl FromRef<RelayState> for AuthState {
    fn from_ref(input: &RelayState) -> Self {
        input.auth.clone()
    }
}
