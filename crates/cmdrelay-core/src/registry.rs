// User registry
//
// Maps sender ids to their latest registration and tracks the set of
// display names that have ever been registered as authorized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Role of a client as known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Authorized to broadcast commands to alts.
    Admin,
    /// Registered without authorization.
    Alt,
    /// Never registered; treated as non-admin.
    Unknown,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Alt => write!(f, "alt"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// How admin status of a sender is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AdminMatch {
    /// Display name is in the authorized-name set. Two ids sharing a name
    /// share admin status. An empty name is never authorized.
    #[default]
    Name,
    /// The sender id's own registration is authorized.
    Id,
}

impl AdminMatch {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "id" => AdminMatch::Id,
            _ => AdminMatch::Name,
        }
    }
}

/// A client's latest registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub script_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub is_authorized: bool,
    pub registered_at: DateTime<Utc>,
}

impl RegisteredUser {
    pub fn role(&self) -> Role {
        if self.is_authorized {
            Role::Admin
        } else {
            Role::Alt
        }
    }
}

/// Registry of clients and authorized display names.
#[derive(Debug, Default, Clone)]
pub struct UserRegistry {
    users: HashMap<String, RegisteredUser>,
    authorized_names: HashSet<String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `sender_id`.
    ///
    /// An authorized registration adds a non-empty `sender_name` to the
    /// authorized-name set. Names are never removed from that set.
    pub fn register(
        &mut self,
        sender_id: &str,
        script_id: &str,
        sender_name: &str,
        is_authorized: bool,
        registered_at: DateTime<Utc>,
    ) -> RegisteredUser {
        let user = RegisteredUser {
            script_id: script_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            is_authorized,
            registered_at,
        };

        if is_authorized && !sender_name.is_empty() {
            self.authorized_names.insert(sender_name.to_string());
        }

        if let Some(previous) = self.users.insert(sender_id.to_string(), user.clone()) {
            tracing::debug!(
                sender_id,
                previous_name = %previous.sender_name,
                "Registration overwritten"
            );
        }

        user
    }

    /// Stored role for `sender_id`, or `Role::Unknown` when never registered.
    pub fn role_of(&self, sender_id: &str) -> Role {
        self.users
            .get(sender_id)
            .map(RegisteredUser::role)
            .unwrap_or(Role::Unknown)
    }

    /// Stored display name for `sender_id`.
    pub fn display_name_of(&self, sender_id: &str) -> Option<&str> {
        self.users.get(sender_id).map(|u| u.sender_name.as_str())
    }

    /// Whether `name` is in the authorized-name set.
    pub fn lookup_by_name(&self, name: &str) -> bool {
        !name.is_empty() && self.authorized_names.contains(name)
    }

    /// Admin check used when a command is written.
    pub fn is_admin_sender(&self, sender_id: &str, sender_name: &str, mode: AdminMatch) -> bool {
        match mode {
            AdminMatch::Name => self.lookup_by_name(sender_name),
            AdminMatch::Id => self.role_of(sender_id).is_admin(),
        }
    }

    pub fn get(&self, sender_id: &str) -> Option<&RegisteredUser> {
        self.users.get(sender_id)
    }

    /// All registrations ordered by registration time.
    pub fn users(&self) -> Vec<RegisteredUser> {
        let mut users: Vec<RegisteredUser> = self.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.sender_id.cmp(&b.sender_id))
        });
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn authorized_count(&self) -> usize {
        self.authorized_names.len()
    }
}
