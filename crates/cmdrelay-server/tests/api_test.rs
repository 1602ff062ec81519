// Router-level tests for the relay HTTP API

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use cmdrelay_core::{CommandRelay, FilterMode, RelayOptions};
use cmdrelay_server::{auth::AuthConfig, build_app, ServerConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "relay-secret";

fn app_with(config: ServerConfig) -> Router {
    let relay = Arc::new(CommandRelay::new(config.relay.clone()));
    build_app(relay, &config)
}

fn open_app() -> Router {
    app_with(ServerConfig::default())
}

fn secured_app() -> Router {
    app_with(ServerConfig {
        auth: AuthConfig {
            api_key: Some(SECRET.to_string()),
            require_api_key: true,
        },
        ..ServerConfig::default()
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn register(app: &Router, sender_id: &str, name: &str, authorized: bool) {
    let (status, body) = send(
        app,
        post_json(
            "/v1/commands",
            json!({
                "scriptId": "s1",
                "senderId": sender_id,
                "senderName": name,
                "command": "register",
                "args": {"isAuthorized": authorized}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
}

async fn submit(app: &Router, sender_id: &str, name: &str, command: &str, args: Value) -> Value {
    let (status, body) = send(
        app,
        post_json(
            "/v1/commands",
            json!({
                "scriptId": "s1",
                "senderId": sender_id,
                "senderName": name,
                "command": command,
                "args": args
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "submit failed: {}", body);
    body
}

async fn poll(app: &Router, sender_id: &str) -> Vec<Value> {
    let (status, body) = send(
        app,
        get(&format!("/v1/commands?scriptId=s1&senderId={}", sender_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "poll failed: {}", body);
    assert_eq!(
        body["count"].as_u64().unwrap() as usize,
        body["commands"].as_array().unwrap().len()
    );
    body["commands"].as_array().unwrap().clone()
}

/// (commands, registeredUsers) as reported by the public status endpoint
async fn relay_counts(app: &Router) -> (u64, u64) {
    let (status, body) = send(app, get("/v1/status")).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["commands"].as_u64().unwrap(),
        body["registeredUsers"].as_u64().unwrap(),
    )
}

async fn admin_and_alts(app: &Router) {
    register(app, "A", "Admin1", true).await;
    register(app, "B", "Alt1", false).await;
    register(app, "C", "Alt2", false).await;
}

#[tokio::test]
async fn test_admin_broadcast_reaches_alts_only() {
    let app = open_app();
    admin_and_alts(&app).await;

    let body = submit(&app, "A", "Admin1", "bring", json!({})).await;
    assert_eq!(body["command"]["isAdminCommand"], true);
    assert_eq!(body["command"]["targetAlts"], "all");

    let b = poll(&app, "B").await;
    assert_eq!(b.len(), 1);
    assert_eq!(b[0]["command"], "bring");
    assert_eq!(poll(&app, "C").await.len(), 1);

    // Sender never sees its own record
    assert!(poll(&app, "A").await.is_empty());
}

#[tokio::test]
async fn test_polling_does_not_consume() {
    let app = open_app();
    admin_and_alts(&app).await;
    submit(&app, "A", "Admin1", "bring", json!({})).await;

    assert_eq!(poll(&app, "B").await.len(), 1);
    assert_eq!(poll(&app, "B").await.len(), 1);
}

#[tokio::test]
async fn test_targeted_command_reaches_named_alt() {
    let app = open_app();
    admin_and_alts(&app).await;

    submit(&app, "A", "Admin1", "follow", json!({"target": "Alt2"})).await;
    assert!(poll(&app, "B").await.is_empty());
    assert_eq!(poll(&app, "C").await.len(), 1);

    submit(&app, "A", "Admin1", "stop", json!({"targetAlts": "B"})).await;
    let b = poll(&app, "B").await;
    assert_eq!(b.len(), 1);
    assert_eq!(b[0]["command"], "stop");
}

#[tokio::test]
async fn test_alt_report_reaches_admin_only() {
    let app = open_app();
    admin_and_alts(&app).await;

    let body = submit(&app, "B", "Alt1", "status", json!({"hp": 10})).await;
    assert_eq!(body["command"]["isAdminCommand"], false);

    let a = poll(&app, "A").await;
    assert_eq!(a.len(), 1);
    assert_eq!(a[0]["senderId"], "B");
    assert!(poll(&app, "C").await.is_empty());
}

#[tokio::test]
async fn test_unknown_args_are_dropped() {
    let app = open_app();
    admin_and_alts(&app).await;

    let body = submit(
        &app,
        "A",
        "Admin1",
        "bring",
        json!({"target": "Alt1", "password": "hunter2"}),
    )
    .await;
    let args = body["command"]["args"].as_object().unwrap();
    assert!(args.contains_key("target"));
    assert!(!args.contains_key("password"));
}

#[tokio::test]
async fn test_other_script_is_isolated() {
    let app = open_app();
    admin_and_alts(&app).await;
    submit(&app, "A", "Admin1", "bring", json!({})).await;

    let (status, body) = send(&app, get("/v1/commands?scriptId=s2&senderId=B")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_flat_mode_targets_by_id() {
    let app = app_with(ServerConfig {
        relay: RelayOptions::default().with_mode(FilterMode::Flat),
        ..ServerConfig::default()
    });
    admin_and_alts(&app).await;

    let body = submit(&app, "A", "Admin1", "follow", json!({"target": "C"})).await;
    assert_eq!(body["command"]["isAdminCommand"], false);
    assert_eq!(body["command"]["isCoordinated"], true);

    assert!(poll(&app, "B").await.is_empty());
    assert_eq!(poll(&app, "C").await.len(), 1);

    // Display names are not matched in flat mode
    submit(&app, "A", "Admin1", "follow", json!({"target": "Alt1"})).await;
    assert!(poll(&app, "B").await.is_empty());
}

#[tokio::test]
async fn test_missing_fields_return_400() {
    let app = open_app();

    let (status, body) = send(
        &app,
        post_json("/v1/commands", json!({"senderId": "A", "command": "bring"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("scriptId"));

    let (status, _) = send(
        &app,
        post_json(
            "/v1/commands",
            json!({
                "senderId": "A",
                "senderName": "Admin1",
                "command": "register",
                "args": {"isAuthorized": true}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(relay_counts(&app).await, (0, 0));

    let (status, body) = send(&app, get("/v1/commands?scriptId=s1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("senderId"));
    assert!(body.get("commands").is_none());
}

#[tokio::test]
async fn test_invalid_json_returns_400() {
    let app = open_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/commands")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn test_oversized_command_rejected() {
    let app = open_app();
    let (status, body) = send(
        &app,
        post_json(
            "/v1/commands",
            json!({
                "scriptId": "s1",
                "senderId": "A",
                "command": "x".repeat(200)
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Input exceeds allowed limits");
}

#[tokio::test]
async fn test_secret_required_when_enforced() {
    let app = secured_app();
    let submission = json!({
        "scriptId": "s1",
        "senderId": "A",
        "senderName": "Admin1",
        "command": "bring"
    });

    let (status, body) = send(&app, post_json("/v1/commands", submission.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "API key required");

    let mut wrong = submission.clone();
    wrong["apiKey"] = json!("nope");
    let (status, body) = send(&app, post_json("/v1/commands", wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid API key");

    let (status, _) = send(
        &app,
        post_json(
            "/v1/commands",
            json!({
                "scriptId": "s1",
                "senderId": "A",
                "senderName": "Admin1",
                "command": "register",
                "args": {"isAuthorized": true},
                "apiKey": "nope"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(relay_counts(&app).await, (0, 0));

    let mut right = submission.clone();
    right["apiKey"] = json!(SECRET);
    let (status, _) = send(&app, post_json("/v1/commands", right)).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut with_header = post_json("/v1/commands", submission);
    with_header
        .headers_mut()
        .insert("x-api-key", SECRET.parse().unwrap());
    let (status, _) = send(&app, with_header).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_rejected_poll_returns_no_commands() {
    let app = secured_app();
    let (status, _) = send(
        &app,
        post_json(
            "/v1/commands",
            json!({
                "scriptId": "s1",
                "senderId": "B",
                "senderName": "Alt1",
                "command": "status",
                "apiKey": SECRET
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, get("/v1/commands?scriptId=s1&senderId=A")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("commands").is_none());
    assert!(body.get("count").is_none());
    assert_eq!(relay_counts(&app).await, (1, 0));
}

#[tokio::test]
async fn test_auth_checked_before_body() {
    let app = secured_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/commands")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_poll_secret_via_query_and_authorization() {
    let app = secured_app();

    let (status, _) = send(&app, get("/v1/commands?scriptId=s1&senderId=B")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        get(&format!(
            "/v1/commands?scriptId=s1&senderId=B&apiKey={}",
            SECRET
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri("/v1/commands?scriptId=s1&senderId=B")
        .header(header::AUTHORIZATION, format!("ApiKey {}", SECRET))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_enforcement_toggle_off_accepts_anything() {
    let app = app_with(ServerConfig {
        auth: AuthConfig {
            api_key: Some(SECRET.to_string()),
            require_api_key: false,
        },
        ..ServerConfig::default()
    });

    let (status, _) = send(
        &app,
        get("/v1/commands?scriptId=s1&senderId=B&apiKey=wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_status_is_public() {
    let app = secured_app();

    let (status, body) = send(&app, get("/v1/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["commands"], 0);
    assert_eq!(body["filterMode"], "role");
    assert_eq!(body["maxCommands"], 100);
}

#[tokio::test]
async fn test_status_counts_records_and_users() {
    let app = open_app();
    admin_and_alts(&app).await;
    submit(&app, "A", "Admin1", "bring", json!({})).await;

    let (_, body) = send(&app, get("/v1/status")).await;
    assert_eq!(body["commands"], 1);
    assert_eq!(body["registeredUsers"], 3);
    assert_eq!(body["authorizedUsers"], 1);
}

#[tokio::test]
async fn test_users_listing() {
    let app = secured_app();

    let (status, _) = send(&app, get("/v1/users")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = post_json(
        "/v1/commands",
        json!({
            "scriptId": "s1",
            "senderId": "A",
            "senderName": "Admin1",
            "command": "register",
            "args": {"isAuthorized": "true"},
            "apiKey": SECRET
        }),
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registered"]["isAuthorized"], true);

    let (status, body) = send(&app, get(&format!("/v1/users?apiKey={}", SECRET))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["admins"], 1);
    assert_eq!(body["users"][0]["role"], "admin");
}

#[tokio::test]
async fn test_root_and_health() {
    let app = app_with(ServerConfig {
        api_prefix: "/api".to_string(),
        ..ServerConfig::default()
    });

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authRequired"], false);
    let endpoints = body["endpoints"].as_array().unwrap();
    assert!(endpoints
        .iter()
        .any(|e| e["path"] == "/api/v1/commands" && e["method"] == "POST"));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["filterMode"], "role");

    // Relay routes move under the prefix
    let (status, _) = send(&app, get("/api/v1/status")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/v1/status")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_served() {
    let app = open_app();
    let (status, body) = send(&app, get("/api-doc/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/v1/commands").is_some());
}
