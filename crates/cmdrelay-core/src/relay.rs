// Command relay state container
//
// Owns the command log and the user registry, each behind its own mutex.
// Constructed once at startup and shared behind an Arc; there is no global
// state. Every operation takes the receipt instant as a parameter.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{RelayError, Result};
use crate::filter::{FilterMode, Poller, VisibilityFilter, DEFAULT_POLL_WINDOW};
use crate::log::{CommandLog, DEFAULT_CAPACITY, DEFAULT_RETENTION, MAX_CAPACITY};
use crate::record::{sanitize_args, CommandRecord, Submission, Target};
use crate::registry::{AdminMatch, RegisteredUser, UserRegistry};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Tunables of a relay instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOptions {
    pub mode: FilterMode,
    pub admin_match: AdminMatch,
    pub capacity: usize,
    pub poll_window: Duration,
    pub retention: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            mode: FilterMode::Role,
            admin_match: AdminMatch::Name,
            capacity: DEFAULT_CAPACITY,
            poll_window: DEFAULT_POLL_WINDOW,
            retention: DEFAULT_RETENTION,
        }
    }
}

impl RelayOptions {
    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_admin_match(mut self, admin_match: AdminMatch) -> Self {
        self.admin_match = admin_match;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.clamp(1, MAX_CAPACITY);
        self
    }

    pub fn with_poll_window(mut self, window: Duration) -> Self {
        self.poll_window = window;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A `register` command updated the registry; nothing was logged.
    Registered(RegisteredUser),
    /// The command was appended to the log.
    Queued(CommandRecord),
}

/// Point-in-time counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    pub commands: usize,
    pub registered_users: usize,
    pub authorized_users: usize,
    pub filter_mode: FilterMode,
}

/// Shared command log plus user registry.
pub struct CommandRelay {
    options: RelayOptions,
    filter: VisibilityFilter,
    log: Mutex<CommandLog>,
    registry: Mutex<UserRegistry>,
}

impl Default for CommandRelay {
    fn default() -> Self {
        Self::new(RelayOptions::default())
    }
}

impl CommandRelay {
    pub fn new(options: RelayOptions) -> Self {
        Self {
            filter: VisibilityFilter::new(options.mode, options.poll_window),
            log: Mutex::new(CommandLog::new(options.capacity, options.retention)),
            registry: Mutex::new(UserRegistry::new()),
            options,
        }
    }

    pub fn options(&self) -> &RelayOptions {
        &self.options
    }

    /// Accept a submission received at `now`.
    ///
    /// `register` commands only touch the registry. Any other command is
    /// stamped with the sender's current admin status and appended to the log.
    pub fn submit(&self, submission: Submission, now: DateTime<Utc>) -> Result<SubmitOutcome> {
        submission.validate()?;

        if submission.is_registration() {
            let is_authorized = submission.is_authorized_flag();
            let user = self.registry.lock().register(
                &submission.sender_id,
                &submission.script_id,
                &submission.sender_name,
                is_authorized,
                now,
            );
            tracing::info!(
                sender_id = %user.sender_id,
                sender_name = %user.sender_name,
                script_id = %user.script_id,
                role = %user.role(),
                "Client registered"
            );
            return Ok(SubmitOutcome::Registered(user));
        }

        let is_admin = match self.options.mode {
            FilterMode::Role => self.registry.lock().is_admin_sender(
                &submission.sender_id,
                &submission.sender_name,
                self.options.admin_match,
            ),
            FilterMode::Flat => false,
        };
        let is_coordinated = match self.options.mode {
            FilterMode::Role => is_admin,
            FilterMode::Flat => submission.has_coordination_metadata(),
        };
        let target_alts = submission
            .explicit_target()
            .map(Target::Recipient)
            .unwrap_or_default();

        let record = CommandRecord {
            id: Uuid::now_v7(),
            args: sanitize_args(&submission.args),
            timestamp: submission.timestamp.unwrap_or_else(|| now.timestamp_millis()),
            created_at: now,
            is_admin_command: is_admin,
            is_coordinated,
            target_alts,
            script_id: submission.script_id,
            sender_id: submission.sender_id,
            sender_name: submission.sender_name,
            command: submission.command,
        };

        let (evicted, size) = {
            let mut log = self.log.lock();
            log.append(record.clone());
            let evicted = log.trim_to_capacity();
            (evicted, log.len())
        };

        tracing::debug!(
            id = %record.id,
            command = %record.command,
            sender_id = %record.sender_id,
            admin = record.is_admin_command,
            target = %record.target_alts,
            log_size = size,
            evicted,
            "Command queued"
        );

        Ok(SubmitOutcome::Queued(record))
    }

    /// Records visible to `poller_id` in `script_id` at `now`, in insertion order.
    ///
    /// Nothing is consumed; the same record is returned on every poll inside
    /// its recency window.
    pub fn poll(
        &self,
        script_id: &str,
        poller_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CommandRecord>> {
        if script_id.is_empty() {
            return Err(RelayError::missing("scriptId"));
        }
        if poller_id.is_empty() {
            return Err(RelayError::missing("senderId"));
        }

        let (display_name, is_admin) = {
            let registry = self.registry.lock();
            (
                registry.display_name_of(poller_id).map(str::to_string),
                registry.role_of(poller_id).is_admin(),
            )
        };

        let poller = Poller {
            script_id,
            sender_id: poller_id,
            display_name: display_name.as_deref(),
            is_admin,
        };

        let log = self.log.lock();
        Ok(self
            .filter
            .select(log.iter(), &poller, now.timestamp_millis()))
    }

    /// Drop records older than the retention period. Returns how many were removed.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        self.log.lock().prune_by_age(now.timestamp_millis())
    }

    pub fn stats(&self) -> RelayStats {
        let commands = self.log.lock().len();
        let registry = self.registry.lock();
        RelayStats {
            commands,
            registered_users: registry.len(),
            authorized_users: registry.authorized_count(),
            filter_mode: self.options.mode,
        }
    }

    pub fn users(&self) -> Vec<RegisteredUser> {
        self.registry.lock().users()
    }
}
