// Authentication configuration loaded from environment variables.
// Decision: A single shared secret (RELAY_API_KEY) guards the command endpoints
// Decision: Enforcement defaults to on when a secret is configured, off otherwise

/// Shared secret settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Shared secret clients must present
    pub api_key: Option<String>,
    /// Whether the secret is enforced
    pub require_api_key: bool,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("RELAY_API_KEY").filter(|s| !s.is_empty());

        let require_api_key = lookup("RELAY_REQUIRE_API_KEY")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(api_key.is_some());

        if require_api_key && api_key.is_none() {
            tracing::warn!(
                "RELAY_REQUIRE_API_KEY is set but RELAY_API_KEY is empty, authentication disabled"
            );
        }

        Self {
            api_key,
            require_api_key,
        }
    }

    /// Shared secret that must be matched, if enforcement is active
    pub fn enforced_key(&self) -> Option<&str> {
        if self.require_api_key {
            self.api_key.as_deref()
        } else {
            None
        }
    }

    /// Check if authentication is enabled
    pub fn is_enabled(&self) -> bool {
        self.enforced_key().is_some()
    }
}
