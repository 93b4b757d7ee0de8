//! Backend trait definition.

use serde_json::Value;
use tracing::error;
use vdictl_protocol::{CommandRequest, ResponseEnvelope};

use crate::error::{BackendError, BackendResult};

/// A transport able to execute protocol commands against the control plane.
///
/// Implementations are configured once and hold no per-call state. Calls are
/// synchronous: `execute` blocks until the script exits or the HTTP round
/// trip completes, and either returns the complete `Data` value of the
/// response envelope or fails. Nothing is retried.
///
/// Implementations must encode parameters exactly as described by
/// [`Command::params`](vdictl_protocol::Command::params).
pub trait Backend: Send + Sync {
    /// Returns the name of this backend (e.g. "process", "http").
    fn name(&self) -> &str;

    /// Executes a command and returns the `Data` member of the response.
    ///
    /// Commands without a response payload return [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`](crate::BackendError) categorized as
    /// transport, decode or toolstack failure.
    fn execute(&self, request: &CommandRequest) -> BackendResult<Value>;
}

/// Extracts `Data` from a decoded envelope, failing on a nonzero execution status.
pub(crate) fn envelope_data(envelope: ResponseEnvelope) -> BackendResult<Value> {
    if !envelope.status.is_success() {
        error!(
            execution_status = envelope.status.execution_status,
            error_message = %envelope.status.error_message(),
            "toolstack reported an error"
        );
        return Err(BackendError::toolstack(envelope.status.error_message()));
    }
    Ok(envelope.data)
}
