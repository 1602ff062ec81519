// Command log
//
// Append-only sequence of records bounded by count and age. Entries are never
// reordered or modified; eviction only ever removes from the front.

use std::collections::VecDeque;
use std::time::Duration;

use crate::record::CommandRecord;

/// Maximum number of records kept in the log.
pub const DEFAULT_CAPACITY: usize = 100;

/// Upper bound accepted for a configured capacity.
pub const MAX_CAPACITY: usize = 100_000;

/// Records older than this are dropped by a prune cycle.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 60);

/// Whole milliseconds in `d`, saturating at `i64::MAX`.
pub(crate) fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Bounded, insertion-ordered record log.
#[derive(Debug, Clone)]
pub struct CommandLog {
    entries: VecDeque<CommandRecord>,
    capacity: usize,
    retention: Duration,
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_RETENTION)
    }
}

impl CommandLog {
    pub fn new(capacity: usize, retention: Duration) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY) + 1),
            capacity,
            retention,
        }
    }

    /// Add a record at the end of the log.
    pub fn append(&mut self, record: CommandRecord) {
        self.entries.push_back(record);
    }

    /// Keep only the most recent `capacity` records. Returns how many were evicted.
    pub fn trim_to_capacity(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.capacity);
        self.entries.drain(..excess);
        excess
    }

    /// Remove every record whose timestamp is older than `now_ms - retention`.
    /// Returns how many were removed.
    pub fn prune_by_age(&mut self, now_ms: i64) -> usize {
        let cutoff = now_ms.saturating_sub(duration_millis(self.retention));
        let before = self.entries.len();
        // Client timestamps are not monotonic, so scan the whole log
        self.entries.retain(|record| record.timestamp >= cutoff);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}
