// Root and health routes
//
// Both payloads are static for the lifetime of the process and are built
// once when the router is assembled.

use axum::{extract::State, routing::get, Json, Router};
use cmdrelay_core::FilterMode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// One documented endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EndpointDoc {
    pub method: String,
    pub path: String,
    pub description: String,
    pub auth: bool,
}

/// Capability document served at the root
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub filter_mode: FilterMode,
    pub auth_required: bool,
    pub poll_window_secs: u64,
    pub endpoints: Vec<EndpointDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub filter_mode: FilterMode,
    pub auth_required: bool,
}

/// State for root and health endpoints
#[derive(Clone)]
pub struct RootState {
    root: Arc<RootResponse>,
    health: Arc<HealthResponse>,
}

impl RootState {
    pub fn new(
        api_prefix: &str,
        filter_mode: FilterMode,
        auth_required: bool,
        poll_window_secs: u64,
    ) -> Self {
        let endpoint = |method: &str, path: &str, description: &str, auth: bool| EndpointDoc {
            method: method.to_string(),
            path: format!("{}{}", api_prefix, path),
            description: description.to_string(),
            auth: auth && auth_required,
        };

        let root = RootResponse {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Polling command relay for script clients".to_string(),
            filter_mode,
            auth_required,
            poll_window_secs,
            endpoints: vec![
                endpoint(
                    "POST",
                    "/v1/commands",
                    "Submit a command (scriptId, senderId, senderName, command, args, timestamp). \
                     The register command records the sender's role instead.",
                    true,
                ),
                endpoint(
                    "GET",
                    "/v1/commands",
                    "Poll commands visible to senderId within scriptId",
                    true,
                ),
                endpoint("GET", "/v1/status", "Log and registry counters", false),
                endpoint("GET", "/v1/users", "Registered clients and roles", true),
            ],
        };

        let health = HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            filter_mode,
            auth_required,
        };

        Self {
            root: Arc::new(root),
            health: Arc::new(health),
        }
    }
}

/// Create root and health routes (never prefixed)
pub fn routes(state: RootState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
}

/// GET / - Capability document
pub async fn root(State(state): State<RootState>) -> Json<RootResponse> {
    Json(state.root.as_ref().clone())
}

/// GET /health - Liveness
pub async fn health(State(state): State<RootState>) -> Json<HealthResponse> {
    Json(state.health.as_ref().clone())
}
