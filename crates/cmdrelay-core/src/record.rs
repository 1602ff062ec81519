// Command record domain types
//
// A CommandRecord is created once per accepted submission and never mutated
// afterwards. Submission is the parsed inbound request the transport hands
// to the relay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{RelayError, Result};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Command name trapped by the relay to update the user registry.
pub const REGISTER_COMMAND: &str = "register";

/// Wire value for a broadcast target.
pub const TARGET_ALL: &str = "all";

/// Keys kept in a record's `args`. Everything else is dropped before storage.
pub const ALLOWED_ARG_KEYS: [&str; 7] = [
    "command",
    "args",
    "targetAlts",
    "target",
    "mainUser",
    "commandId",
    "timestamp",
];

/// Addressing restriction of a record.
///
/// Serialized as a plain string: `"all"` or the recipient's name or id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Target {
    /// Every eligible poller
    #[default]
    All,
    /// A single recipient, matched against display name or id
    Recipient(String),
}

impl Target {
    pub fn as_str(&self) -> &str {
        match self {
            Target::All => TARGET_ALL,
            Target::Recipient(recipient) => recipient,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Target::All)
    }

    /// True when the target addresses the given poller by name or id.
    pub fn addresses(&self, display_name: Option<&str>, poller_id: &str) -> bool {
        match self {
            Target::All => true,
            Target::Recipient(recipient) => {
                recipient == poller_id || display_name == Some(recipient.as_str())
            }
        }
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        if s.is_empty() || s == TARGET_ALL {
            Target::All
        } else {
            Target::Recipient(s)
        }
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::from(s.to_string())
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        match target {
            Target::All => TARGET_ALL.to_string(),
            Target::Recipient(recipient) => recipient,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A command stored in the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    /// Unique identifier (UUID v7).
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: Uuid,
    /// Grouping key. Pollers only see records of their own script.
    pub script_id: String,
    /// Identifier of the sending client.
    pub sender_id: String,
    /// Display name of the sending client.
    pub sender_name: String,
    /// Command name.
    pub command: String,
    /// Allow-listed auxiliary fields.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub args: Map<String, Value>,
    /// Client send time in epoch milliseconds. Drives recency filtering.
    pub timestamp: i64,
    /// Server receipt time.
    pub created_at: DateTime<Utc>,
    /// Whether the sender was an admin when the record was written.
    pub is_admin_command: bool,
    /// Whether the record carries coordination metadata.
    pub is_coordinated: bool,
    /// Addressing restriction.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub target_alts: Target,
}

/// Drop every key not in [`ALLOWED_ARG_KEYS`].
pub fn sanitize_args(raw: &Map<String, Value>) -> Map<String, Value> {
    raw.iter()
        .filter(|(key, _)| ALLOWED_ARG_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Inbound command, already parsed from the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub script_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub command: String,
    pub args: Map<String, Value>,
    /// Client send time; the receipt time is used when absent.
    pub timestamp: Option<i64>,
}

impl Submission {
    pub fn new(
        script_id: impl Into<String>,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            script_id: script_id.into(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check the required fields are present.
    pub fn validate(&self) -> Result<()> {
        if self.script_id.is_empty() {
            return Err(RelayError::missing("scriptId"));
        }
        if self.sender_id.is_empty() {
            return Err(RelayError::missing("senderId"));
        }
        if self.command.is_empty() {
            return Err(RelayError::missing("command"));
        }
        Ok(())
    }

    pub fn is_registration(&self) -> bool {
        self.command == REGISTER_COMMAND
    }

    /// `args.isAuthorized` of a registration. Accepts a bool or `"true"`.
    pub fn is_authorized_flag(&self) -> bool {
        match self.args.get("isAuthorized") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Explicit recipient from `args.target`, falling back to `args.targetAlts`.
    /// `"all"` and empty strings are not explicit.
    pub fn explicit_target(&self) -> Option<String> {
        ["target", "targetAlts"]
            .iter()
            .filter_map(|key| self.args.get(*key).and_then(Value::as_str))
            .find(|value| !value.is_empty() && *value != TARGET_ALL)
            .map(str::to_string)
    }

    /// True when the client supplied any coordination metadata.
    pub fn has_coordination_metadata(&self) -> bool {
        ["target", "targetAlts", "mainUser"]
            .iter()
            .any(|key| self.args.contains_key(*key))
    }
}
