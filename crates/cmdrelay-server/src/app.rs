// Router assembly
// Decision: Root, health and OpenAPI routes are never prefixed; /v1 routes honor API_PREFIX
// Decision: A panicking handler yields a 500 ErrorResponse instead of dropping the connection

use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use cmdrelay_core::CommandRelay;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api::{self, root::RootState, ErrorResponse, RelayState};
use crate::auth::{api_key::API_KEY_HEADER, AuthState};
use crate::config::{CorsConfig, ServerConfig};
use crate::openapi::{ApiDoc, OPENAPI_PATH};

/// Build the full application router for a relay and configuration
pub fn build_app(relay: Arc<CommandRelay>, config: &ServerConfig) -> Router {
    let auth_state = AuthState::new(&config.auth);
    let state = RelayState::new(relay.clone(), auth_state.clone());

    let api_routes = Router::new()
        .merge(api::commands::routes(state.clone()))
        .merge(api::status::routes(state.clone()))
        .merge(api::users::routes(state));

    let root_state = RootState::new(
        &config.api_prefix,
        relay.options().mode,
        auth_state.is_enabled(),
        relay.options().poll_window.as_secs(),
    );

    let app = Router::new()
        .merge(api::root::routes(root_state))
        .route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .merge(build_router_with_prefix(api_routes, &config.api_prefix));

    let app = match cors_layer(&config.cors) {
        Some(cors) => app.layer(cors),
        None => app,
    };

    app.layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

/// Build router with optional API prefix
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    match cors {
        CorsConfig::Disabled => None,
        // Wildcard origins cannot carry credentials
        CorsConfig::Any => Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        ),
        CorsConfig::Origins(origins) => Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins.clone()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                    HeaderName::from_static(API_KEY_HEADER),
                ])
                .allow_credentials(true),
        ),
    }
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    ErrorResponse::new("Internal server error")
        .into_response(StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}
