// Status route
// Decision: Status is public so operators can check the relay without the secret

use axum::{extract::State, routing::get, Json, Router};
use cmdrelay_core::{FilterMode, RelayStats};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RelayState;

/// Relay counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    /// Records currently held in the log, pollable or not.
    pub commands: usize,
    pub registered_users: usize,
    /// Display names registered as authorized.
    pub authorized_users: usize,
    pub filter_mode: FilterMode,
    pub max_commands: usize,
    pub poll_window_secs: u64,
}

impl StatusResponse {
    fn from_stats(stats: RelayStats, max_commands: usize, poll_window_secs: u64) -> Self {
        Self {
            status: "ok".to_string(),
            commands: stats.commands,
            registered_users: stats.registered_users,
            authorized_users: stats.authorized_users,
            filter_mode: stats.filter_mode,
            max_commands,
            poll_window_secs,
        }
    }
}

/// Create status routes
pub fn routes(state: RelayState) -> Router {
    Router::new()
        .route("/v1/status", get(get_status))
        .with_state(state)
}

/// GET /v1/status - Relay counters
#[utoipa::path(
    get,
    path = "/v1/status",
    responses(
        (status = 200, description = "Relay status", body = StatusResponse)
    ),
    tag = "status"
)]
pub async fn get_status(State(state): State<RelayState>) -> Json<StatusResponse> {
    let options = state.relay.options();
    Json(StatusResponse::from_stats(
        state.relay.stats(),
        options.capacity,
        options.poll_window.as_secs(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let stats = RelayStats {
            commands: 3,
            registered_users: 2,
            authorized_users: 1,
            filter_mode: FilterMode::Role,
        };
        let value = serde_json::to_value(StatusResponse::from_stats(stats, 100, 30)).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["commands"], 3);
        assert_eq!(value["registeredUsers"], 2);
        assert_eq!(value["authorizedUsers"], 1);
        assert_eq!(value["filterMode"], "role");
        assert_eq!(value["pollWindowSecs"], 30);
    }
}
