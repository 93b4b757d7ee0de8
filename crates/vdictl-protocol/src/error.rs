//! Protocol error types.

use thiserror::Error;

use crate::command::{Command, Param};

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while building requests or decoding responses.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A parameter the command requires is absent or empty.
    #[error("{command}: missing required parameter '{param}'")]
    MissingParameter { command: Command, param: Param },

    /// A parameter was supplied that the command does not accept.
    #[error("{command}: unexpected parameter '{param}'")]
    UnexpectedParameter { command: Command, param: Param },

    /// A switch was supplied where text was expected, or vice versa.
    #[error("{command}: parameter '{param}' has the wrong type")]
    InvalidParameterType { command: Command, param: Param },

    /// The command name is not part of the protocol.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An enumerated argument (message style, power action) was not recognized.
    #[error("unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// The payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON does not have the `{Status, Data}` shape.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A version string could not be parsed.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },
}
