//! Error types for backend operations.
//!
//! Every failure a backend can raise falls in one of four categories:
//!
//! - transport: the process could not run cleanly, or the HTTP exchange failed
//! - decode: the output could not be turned into a `{Status, Data}` envelope
//! - toolstack: the envelope reports a nonzero `ExecutionStatus`
//! - configuration: bad arguments or an incompatible server, caught before any call

use std::fmt;

use thiserror::Error;
use vdictl_protocol::{Command, ProtocolError};

/// The category of a backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorCode {
    /// Process spawn failure, non-zero exit, stderr output, HTTP connection or timeout failure.
    Transport,
    /// Text decoding or JSON parsing failed, or the envelope lacks `Status`/`Data`.
    Decode,
    /// The toolstack reported a nonzero execution status.
    Toolstack,
    /// Invalid configuration or arguments, or an incompatible server version.
    Configuration,
}

impl BackendErrorCode {
    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport_error",
            Self::Decode => "decode_error",
            Self::Toolstack => "toolstack_error",
            Self::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised by a backend.
#[derive(Debug, Error)]
pub struct BackendError {
    /// The error code categorizing this error.
    code: BackendErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The command being executed, if any.
    command: Option<Command>,
    /// The backend that raised the error (e.g. "process", "http").
    backend: Option<String>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    /// Creates a new backend error with the given code and message.
    pub fn new(code: BackendErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            command: None,
            backend: None,
            source: None,
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Transport, message)
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Decode, message)
    }

    /// Creates a toolstack error carrying the toolstack's error message.
    pub fn toolstack(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Toolstack, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Configuration, message)
    }

    /// Sets the command for this error.
    pub fn with_command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Sets the backend name for this error.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> BackendErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the command, if set.
    pub fn command(&self) -> Option<Command> {
        self.command
    }

    /// Returns the backend name, if set.
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    /// Returns true for transport errors.
    pub fn is_transport(&self) -> bool {
        self.code == BackendErrorCode::Transport
    }

    /// Returns true for decode errors.
    pub fn is_decode(&self) -> bool {
        self.code == BackendErrorCode::Decode
    }

    /// Returns true for toolstack errors.
    pub fn is_toolstack(&self) -> bool {
        self.code == BackendErrorCode::Toolstack
    }

    /// Returns true for configuration errors.
    pub fn is_configuration(&self) -> bool {
        self.code == BackendErrorCode::Configuration
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref backend) = self.backend {
            write!(f, "[{}] ", backend)?;
        }
        write!(f, "{}", self.code)?;
        if let Some(command) = self.command {
            write!(f, " ({})", command)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl From<ProtocolError> for BackendError {
    fn from(err: ProtocolError) -> Self {
        let code = match err {
            ProtocolError::Json(_) | ProtocolError::MalformedEnvelope(_) => {
                BackendErrorCode::Decode
            }
            _ => BackendErrorCode::Configuration,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

/// A specialized Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vdictl_protocol::CommandRequest;

    #[test]
    fn error_code_display() {
        assert_eq!(BackendErrorCode::Transport.as_str(), "transport_error");
        assert_eq!(BackendErrorCode::Toolstack.to_string(), "toolstack_error");
    }

    #[test]
    fn backend_error_creation() {
        let err = BackendError::toolstack("machine not found");
        assert_eq!(err.code(), BackendErrorCode::Toolstack);
        assert_eq!(err.message(), "machine not found");
        assert!(err.is_toolstack());
        assert!(err.command().is_none());
        assert!(err.backend().is_none());
    }

    #[test]
    fn backend_error_display() {
        let err = BackendError::toolstack("x")
            .with_backend("process")
            .with_command(Command::GetSessions);
        assert_eq!(err.to_string(), "[process] toolstack_error (GetSessions): x");
    }

    #[test]
    fn backend_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("no such file");
        let err = BackendError::transport("spawn failed").with_source(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn protocol_errors_map_to_categories() {
        let missing = CommandRequest::new(Command::DisconnectSession)
            .validate()
            .unwrap_err();
        let err = BackendError::from(missing);
        assert!(err.is_configuration());
        assert!(err.message().contains("machine"));

        let malformed = vdictl_protocol::decode_envelope(r#"{"Data": []}"#).unwrap_err();
        assert!(BackendError::from(malformed).is_decode());

        let json = vdictl_protocol::decode_envelope("nope").unwrap_err();
        assert!(BackendError::from(json).is_decode());
    }
}
