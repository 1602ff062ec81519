// Authentication extractors
// Decision: The secret may arrive as X-API-Key, "Authorization: ApiKey <key>" or ?apiKey=
// Decision: When enforcement is off every request is accepted, whatever it supplies

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::{header, request::Parts},
};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use super::{
    api_key::{hash_api_key, verify_api_key, API_KEY_HEADER, API_KEY_SCHEME},
    config::AuthConfig,
};
use crate::api::ApiError;

/// Auth state shared across routes
#[derive(Clone, Debug)]
pub struct AuthState {
    /// Digest of the enforced secret; None when enforcement is off
    key_hash: Option<Arc<str>>,
}

impl AuthState {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key_hash: config.enforced_key().map(|key| hash_api_key(key).into()),
        }
    }

    /// State that accepts every request
    pub fn disabled() -> Self {
        Self { key_hash: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.key_hash.is_some()
    }

    /// Check a supplied secret. Always succeeds when enforcement is off.
    pub fn verify(&self, supplied: Option<&str>) -> Result<(), ApiError> {
        let Some(expected) = self.key_hash.as_deref() else {
            return Ok(());
        };

        match supplied {
            None | Some("") => {
                tracing::debug!("Request rejected: API key missing");
                Err(ApiError::authentication("API key required"))
            }
            Some(key) if verify_api_key(key, expected) => Ok(()),
            Some(_) => {
                tracing::warn!("Request rejected: invalid API key");
                Err(ApiError::authentication("Invalid API key"))
            }
        }
    }
}

/// Secret presented in headers or the query string, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppliedApiKey(pub Option<String>);

impl SuppliedApiKey {
    /// Prefer a key from the request body over the transport-level one
    pub fn or_body(self, body_key: Option<String>) -> Option<String> {
        body_key.filter(|k| !k.is_empty()).or(self.0)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SuppliedApiKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SuppliedApiKey(extract_api_key(parts)))
    }
}

fn extract_api_key(parts: &Parts) -> Option<String> {
    if let Some(value) = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return Some(value.to_string());
    }

    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(API_KEY_SCHEME))
    {
        return Some(value.trim().to_string());
    }

    Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(params)| params.get("apiKey").cloned())
        .filter(|v| !v.is_empty())
}

/// Extractor for an authorized request
/// Returns 401 when enforcement is on and the secret is missing or wrong
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authorized
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        auth_state.verify(extract_api_key(parts).as_deref())?;
        Ok(Authorized)
    }
}
