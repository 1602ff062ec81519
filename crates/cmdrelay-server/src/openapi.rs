// OpenAPI specification generation
//
// Served by the relay at /api-doc/openapi.json and printed by the
// export-openapi binary for static builds.

use crate::api;
use cmdrelay_core::{CommandRecord, FilterMode, RegisteredUser, RelayStats, Role};
use utoipa::OpenApi;

/// Path of the served OpenAPI document
pub const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// OpenAPI documentation for the command relay
#[derive(OpenApi)]
#[openapi(
    paths(
        api::commands::submit_command,
        api::commands::poll_commands,
        api::status::get_status,
        api::users::list_users,
    ),
    components(
        schemas(
            CommandRecord, RegisteredUser, Role, FilterMode, RelayStats,
            api::commands::SubmitCommandRequest,
            api::commands::SubmitCommandResponse,
            api::commands::PollQuery,
            api::commands::PollResponse,
            api::status::StatusResponse,
            api::users::User,
            api::users::UsersResponse,
            api::root::RootResponse,
            api::root::HealthResponse,
            api::root::EndpointDoc,
            api::ErrorResponse,
        )
    ),
    tags(
        (name = "commands", description = "Command submission and polling"),
        (name = "status", description = "Relay counters"),
        (name = "users", description = "Registered script clients")
    ),
    info(
        title = "Command Relay API",
        description = "Relay for commands exchanged between script clients that poll over HTTP",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}
