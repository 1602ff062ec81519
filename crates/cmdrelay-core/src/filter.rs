// Visibility filter
//
// Decides which log entries a poller may see. The recency and self-exclusion
// rules are shared by both modes; only the targeting layer differs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::log::duration_millis;
use crate::record::CommandRecord;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Records older than this relative to the poll instant are not returned.
pub const DEFAULT_POLL_WINDOW: Duration = Duration::from_secs(30);

/// Targeting layer applied on top of recency and self-exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Admin broadcasts go to non-admins, everything else goes to admins.
    #[default]
    Role,
    /// No roles: `targetAlts` of `"all"` or the poller id is the only rule.
    Flat,
}

impl FilterMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "flat" | "legacy" => FilterMode::Flat,
            _ => FilterMode::Role,
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::Role => write!(f, "role"),
            FilterMode::Flat => write!(f, "flat"),
        }
    }
}

/// Who is polling, as resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poller<'a> {
    pub script_id: &'a str,
    pub sender_id: &'a str,
    /// Display name stored for `sender_id`, if registered.
    pub display_name: Option<&'a str>,
    pub is_admin: bool,
}

/// Pure visibility predicate.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityFilter {
    mode: FilterMode,
    window_ms: i64,
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self::new(FilterMode::Role, DEFAULT_POLL_WINDOW)
    }
}

impl VisibilityFilter {
    pub fn new(mode: FilterMode, window: Duration) -> Self {
        Self {
            mode,
            window_ms: duration_millis(window),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Whether `record` is visible to `poller` at `now_ms`.
    pub fn is_visible(&self, record: &CommandRecord, poller: &Poller<'_>, now_ms: i64) -> bool {
        record.script_id == poller.script_id
            && record.sender_id != poller.sender_id
            && record.timestamp >= now_ms.saturating_sub(self.window_ms)
            && self.passes_targeting(record, poller)
    }

    fn passes_targeting(&self, record: &CommandRecord, poller: &Poller<'_>) -> bool {
        match self.mode {
            FilterMode::Role => {
                if record.is_admin_command {
                    !poller.is_admin
                        && record
                            .target_alts
                            .addresses(poller.display_name, poller.sender_id)
                } else {
                    poller.is_admin
                }
            }
            FilterMode::Flat => record.target_alts.addresses(None, poller.sender_id),
        }
    }

    /// Insertion-ordered subset of `records` visible to `poller`.
    pub fn select<'r, I>(&self, records: I, poller: &Poller<'_>, now_ms: i64) -> Vec<CommandRecord>
    where
        I: IntoIterator<Item = &'r CommandRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.is_visible(record, poller, now_ms))
            .cloned()
            .collect()
    }
}
