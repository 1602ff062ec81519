// Registered users route
// Decision: Listing requires the shared secret when one is enforced

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use cmdrelay_core::{RegisteredUser, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::ErrorResponse;
use super::RelayState;
use crate::auth::Authorized;

/// Registered client as listed by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub script_id: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

impl From<RegisteredUser> for User {
    fn from(user: RegisteredUser) -> Self {
        Self {
            role: user.role(),
            id: user.sender_id,
            name: user.sender_name,
            script_id: user.script_id,
            registered_at: user.registered_at,
        }
    }
}

/// User listing with aggregate counts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    pub users: Vec<User>,
    pub total: usize,
    pub admins: usize,
    pub alts: usize,
    /// Display names registered as authorized at any point.
    pub authorized_names: usize,
}

/// Create users routes
pub fn routes(state: RelayState) -> Router {
    Router::new()
        .route("/v1/users", get(list_users))
        .with_state(state)
}

/// GET /v1/users - List registered clients
#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "Registered clients", body = UsersResponse),
        (status = 401, description = "API key missing or invalid", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<RelayState>,
    _auth: Authorized, // Require the shared secret when enforced
) -> Json<UsersResponse> {
    let users: Vec<User> = state.relay.users().into_iter().map(User::from).collect();
    let admins = users.iter().filter(|u| u.role == Role::Admin).count();

    Json(UsersResponse {
        total: users.len(),
        alts: users.len() - admins,
        admins,
        authorized_names: state.relay.stats().authorized_users,
        users,
    })
}
