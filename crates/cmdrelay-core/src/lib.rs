// Command Relay Core
//
// Transport-agnostic core of the command relay: a bounded command log, a
// registry of script clients and the visibility filter that decides which
// commands a polling client may see.
//
// Key design decisions:
// - Records are immutable once logged; a poll never consumes them
// - Admin status is captured on the record at write time
// - All time-dependent operations take the current instant as a parameter
// - CommandRelay owns the state; callers share it behind an Arc

pub mod error;
pub mod filter;
pub mod log;
pub mod record;
pub mod registry;
pub mod relay;

// Re-exports for convenience
pub use error::{RelayError, Result};
pub use filter::{FilterMode, Poller, VisibilityFilter, DEFAULT_POLL_WINDOW};
pub use log::{CommandLog, DEFAULT_CAPACITY, DEFAULT_RETENTION, MAX_CAPACITY};
pub use record::{
    sanitize_args, CommandRecord, Submission, Target, ALLOWED_ARG_KEYS, REGISTER_COMMAND,
};
pub use registry::{AdminMatch, RegisteredUser, Role, UserRegistry};
pub use relay::{CommandRelay, RelayOptions, RelayStats, SubmitOutcome};
