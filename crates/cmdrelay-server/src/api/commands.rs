// Command submit and poll routes

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use cmdrelay_core::{CommandRecord, RegisteredUser, SubmitOutcome, Submission};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

use super::common::{ApiError, ErrorResponse};
use super::validation::{validate_poll_limits, validate_submission_limits};
use super::RelayState;
use crate::auth::{Authorized, SuppliedApiKey};

/// Request to submit a command
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCommandRequest {
    /// Script grouping key.
    #[schema(example = "s1")]
    pub script_id: Option<String>,
    /// Identifier of the sending client.
    #[schema(example = "A")]
    pub sender_id: Option<String>,
    /// Display name of the sending client.
    #[schema(example = "Admin1")]
    pub sender_name: Option<String>,
    /// Command name. `register` updates the user registry instead of queuing.
    #[schema(example = "bring")]
    pub command: Option<String>,
    /// Auxiliary fields. Unknown keys are dropped before storage.
    #[schema(value_type = Option<Object>)]
    pub args: Option<Value>,
    /// Client send time in epoch milliseconds.
    pub timestamp: Option<f64>,
    /// Shared secret, when not sent as a header.
    pub api_key: Option<String>,
}

impl SubmitCommandRequest {
    /// Split into the core submission and the body-supplied key
    fn into_parts(self) -> (Submission, Option<String>) {
        let args = match self.args {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let submission = Submission {
            script_id: self.script_id.unwrap_or_default(),
            sender_id: self.sender_id.unwrap_or_default(),
            sender_name: self.sender_name.unwrap_or_default(),
            command: self.command.unwrap_or_default(),
            args,
            timestamp: self
                .timestamp
                .filter(|t| t.is_finite())
                .map(|t| t as i64),
        };
        (submission, self.api_key)
    }
}

/// Response to an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCommandResponse {
    pub success: bool,
    pub message: String,
    /// Stored record, for queued commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandRecord>,
    /// Registry entry, for `register` commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<RegisteredUser>,
}

/// Query parameters for polling
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PollQuery {
    /// Script grouping key.
    pub script_id: Option<String>,
    /// Identifier of the polling client.
    pub sender_id: Option<String>,
    /// Shared secret, when not sent as a header.
    pub api_key: Option<String>,
}

/// Commands visible to the poller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub commands: Vec<CommandRecord>,
    pub count: usize,
}

/// Create command routes
pub fn routes(state: RelayState) -> Router {
    Router::new()
        .route("/v1/commands", post(submit_command).get(poll_commands))
        .with_state(state)
}

/// POST /v1/commands - Submit a command
#[utoipa::path(
    post,
    path = "/v1/commands",
    request_body = SubmitCommandRequest,
    responses(
        (status = 201, description = "Command queued", body = SubmitCommandResponse),
        (status = 200, description = "Client registered", body = SubmitCommandResponse),
        (status = 400, description = "Missing or oversized field", body = ErrorResponse),
        (status = 401, description = "API key missing or invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "commands"
)]
pub async fn submit_command(
    State(state): State<RelayState>,
    supplied: SuppliedApiKey,
    body: Result<Json<SubmitCommandRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitCommandResponse>), ApiError> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            // Authentication is decided before the body is looked at
            state.auth.verify(supplied.0.as_deref())?;
            return Err(rejection.into());
        }
    };

    let (submission, body_key) = req.into_parts();
    state.auth.verify(supplied.or_body(body_key).as_deref())?;
    validate_submission_limits(&submission)?;

    match state.relay.submit(submission, Utc::now())? {
        SubmitOutcome::Registered(user) => Ok((
            StatusCode::OK,
            Json(SubmitCommandResponse {
                success: true,
                message: format!("Registered {} as {}", user.sender_name, user.role()),
                command: None,
                registered: Some(user),
            }),
        )),
        SubmitOutcome::Queued(record) => Ok((
            StatusCode::CREATED,
            Json(SubmitCommandResponse {
                success: true,
                message: "Command queued".to_string(),
                command: Some(record),
                registered: None,
            }),
        )),
    }
}

/// GET /v1/commands - Poll for visible commands
#[utoipa::path(
    get,
    path = "/v1/commands",
    params(PollQuery),
    responses(
        (status = 200, description = "Commands visible to the poller", body = PollResponse),
        (status = 400, description = "Missing or oversized parameter", body = ErrorResponse),
        (status = 401, description = "API key missing or invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "commands"
)]
pub async fn poll_commands(
    State(state): State<RelayState>,
    _auth: Authorized,
    query: Result<Query<PollQuery>, QueryRejection>,
) -> Result<Json<PollResponse>, ApiError> {
    let Query(query) = query?;
    let script_id = query.script_id.unwrap_or_default();
    let sender_id = query.sender_id.unwrap_or_default();
    validate_poll_limits(&script_id, &sender_id)?;

    let commands = state.relay.poll(&script_id, &sender_id, Utc::now())?;
    tracing::trace!(
        script_id = %script_id,
        sender_id = %sender_id,
        count = commands.len(),
        "Poll served"
    );

    Ok(Json(PollResponse {
        count: commands.len(),
        commands,
    }))
}
