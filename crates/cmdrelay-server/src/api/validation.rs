// Input validation for command submissions
//
// Last-resort size limits to keep a single client from filling the log with
// oversized records. These are hard limits, not configurable.

use super::common::ApiError;
use cmdrelay_core::Submission;

/// Maximum size for scriptId, senderId and senderName.
pub const MAX_IDENTIFIER_BYTES: usize = 256;

/// Maximum size for the command name.
pub const MAX_COMMAND_BYTES: usize = 128;

/// Maximum serialized size of the args object.
pub const MAX_ARGS_BYTES: usize = 16 * 1024; // 16 KB

/// Generic validation error message returned to clients.
/// Intentionally vague to avoid leaking which field exceeded limits.
pub const VALIDATION_ERROR_MESSAGE: &str = "Input exceeds allowed limits";

/// Validation error - returns generic message to avoid leaking details
#[derive(Debug, PartialEq, Eq)]
pub struct ValidationError;

impl From<ValidationError> for ApiError {
    fn from(_: ValidationError) -> Self {
        ApiError::validation(VALIDATION_ERROR_MESSAGE)
    }
}

fn validate_field(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.len() > max {
        tracing::warn!(
            "{} exceeds limit: {} bytes (max: {})",
            field,
            value.len(),
            max
        );
        return Err(ValidationError);
    }
    Ok(())
}

/// Validate all size limits of a submission
pub fn validate_submission_limits(submission: &Submission) -> Result<(), ValidationError> {
    validate_field("scriptId", &submission.script_id, MAX_IDENTIFIER_BYTES)?;
    validate_field("senderId", &submission.sender_id, MAX_IDENTIFIER_BYTES)?;
    validate_field("senderName", &submission.sender_name, MAX_IDENTIFIER_BYTES)?;
    validate_field("command", &submission.command, MAX_COMMAND_BYTES)?;

    let args_len = serde_json::to_string(&submission.args)
        .map(|s| s.len())
        .unwrap_or(usize::MAX);
    if args_len > MAX_ARGS_BYTES {
        tracing::warn!(
            "args exceeds limit: {} bytes (max: {})",
            args_len,
            MAX_ARGS_BYTES
        );
        return Err(ValidationError);
    }
    Ok(())
}

/// Validate poll parameters
pub fn validate_poll_limits(script_id: &str, sender_id: &str) -> Result<(), ValidationError> {
    validate_field("scriptId", script_id, MAX_IDENTIFIER_BYTES)?;
    validate_field("senderId", sender_id, MAX_IDENTIFIER_BYTES)?;
    Ok(())
}
