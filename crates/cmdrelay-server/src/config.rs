// Server configuration loaded from environment variables.
// Decision: Follow the RELAY_ prefix for relay tunables, keep API_PREFIX and
// CORS_ALLOWED_ORIGINS unprefixed
// Decision: Unparseable or out-of-range numbers fall back to defaults with a warning

use axum::http::HeaderValue;
use cmdrelay_core::{AdminMatch, FilterMode, RelayOptions, MAX_CAPACITY};
use std::time::Duration;

use crate::auth::AuthConfig;

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

/// Default interval between prune cycles
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Longest accepted poll window, retention or prune interval
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cross-origin policy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorsConfig {
    /// No CORS layer (same-origin requests only)
    #[default]
    Disabled,
    /// Any origin, no credentials
    Any,
    /// Explicit origin list
    Origins(Vec<HeaderValue>),
}

impl CorsConfig {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CorsConfig::Disabled;
        }
        if s == "*" {
            return CorsConfig::Any;
        }
        let origins: Vec<HeaderValue> = s
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        if origins.is_empty() {
            CorsConfig::Disabled
        } else {
            CorsConfig::Origins(origins)
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Prefix for /v1 routes, e.g. "/api"
    pub api_prefix: String,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub relay: RelayOptions,
    pub prune_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_prefix: String::new(),
            cors: CorsConfig::Disabled,
            auth: AuthConfig::default(),
            relay: RelayOptions::default(),
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RelayOptions::default();

        let bind_addr = lookup("RELAY_ADDR")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let api_prefix = lookup("API_PREFIX")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_default();

        let cors = lookup("CORS_ALLOWED_ORIGINS")
            .map(|s| CorsConfig::parse(&s))
            .unwrap_or_default();

        let relay = RelayOptions::default()
            .with_mode(
                lookup("RELAY_FILTER_MODE")
                    .map(|s| FilterMode::from_str(&s))
                    .unwrap_or_default(),
            )
            .with_admin_match(
                lookup("RELAY_ADMIN_MATCH")
                    .map(|s| AdminMatch::from_str(&s))
                    .unwrap_or_default(),
            )
            .with_capacity(parse_bounded_or(
                &lookup,
                "RELAY_MAX_COMMANDS",
                defaults.capacity,
                MAX_CAPACITY,
            ))
            .with_poll_window(secs_or(&lookup, "RELAY_POLL_WINDOW_SECS", defaults.poll_window))
            .with_retention(secs_or(&lookup, "RELAY_RETENTION_SECS", defaults.retention));

        let prune_interval = secs_or(&lookup, "RELAY_PRUNE_INTERVAL_SECS", DEFAULT_PRUNE_INTERVAL)
            .max(Duration::from_secs(1));

        Self {
            bind_addr,
            api_prefix,
            cors,
            auth: AuthConfig::from_lookup(&lookup),
            relay,
            prune_interval,
        }
    }
}

fn parse_bounded_or<F, T>(lookup: &F, name: &str, default: T, max: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Copy,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value <= max => value,
        _ => {
            tracing::warn!(variable = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

fn secs_or<F>(lookup: &F, name: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_secs(parse_bounded_or(
        lookup,
        name,
        default.as_secs(),
        MAX_DURATION.as_secs(),
    ))
}
