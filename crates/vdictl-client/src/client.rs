//! The client facade.
//!
//! [`VdiClient`] exposes one method per control-plane command. Each method
//! builds a [`CommandRequest`], rejects it before any I/O if a required
//! argument is missing, and hands it to the configured [`Backend`]. Only the
//! `Data` member of the response is returned.

use serde_json::Value;
use tracing::{Span, debug, info_span};
use vdictl_backends::{Backend, BackendError, BackendResult, HttpBackend, ProcessBackend};
use vdictl_protocol::{CommandRequest, MessageStyle, PowerAction};

use crate::config::BackendSettings;
use crate::error::{ClientError, ClientResult};

/// Uniform client over either backend.
pub struct VdiClient {
    backend: Box<dyn Backend>,
    span: Span,
}

impl std::fmt::Debug for VdiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VdiClient")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl VdiClient {
    /// Creates a client driving the given backend.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let span = info_span!("vdi_client", backend = backend.name());
        Self { backend, span }
    }

    /// Builds the configured backend and wraps it in a client.
    ///
    /// For the HTTP backend this runs the version gate.
    pub fn from_settings(settings: &BackendSettings) -> ClientResult<Self> {
        let backend: Box<dyn Backend> = match settings {
            BackendSettings::Process(process) => {
                let config = process.to_backend_config().map_err(ClientError::Config)?;
                Box::new(ProcessBackend::new(config))
            }
            BackendSettings::Http(http) => {
                let config = http.to_backend_config().map_err(ClientError::Config)?;
                Box::new(HttpBackend::connect(config)?)
            }
        };
        Ok(Self::new(backend))
    }

    /// Replaces the span every call is logged under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the name of the backend in use.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Validates and executes a request, returning its `Data`.
    pub fn execute(&self, request: &CommandRequest) -> BackendResult<Value> {
        let _guard = self.span.enter();
        let command = request.command();
        debug!(command = %command, "executing");

        request
            .validate()
            .map_err(BackendError::from)
            .and_then(|()| self.backend.execute(request))
            .map_err(|e| match e.command() {
                Some(_) => e,
                None => e.with_command(command),
            })
    }

    /// Lists all machines.
    pub fn get_machine_status(&self) -> BackendResult<Value> {
        self.execute(&CommandRequest::get_machine_status())
    }

    /// Lists all sessions.
    pub fn get_sessions(&self) -> BackendResult<Value> {
        self.execute(&CommandRequest::get_sessions())
    }

    /// Disconnects the session on a machine.
    pub fn disconnect_session(&self, machine: &str) -> BackendResult<Value> {
        self.execute(&CommandRequest::disconnect_session(machine))
    }

    /// Lists the users entitled to a delivery group.
    pub fn get_access_users(&self, group: &str) -> BackendResult<Value> {
        self.execute(&CommandRequest::get_access_users(group))
    }

    /// Grants (or, with `disable`, revokes) delivery group access.
    pub fn set_access_users<S: AsRef<str>>(
        &self,
        group: &str,
        users: &[S],
        disable: bool,
    ) -> BackendResult<Value> {
        let users = users
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        self.execute(&CommandRequest::set_access_users(group, users, disable))
    }

    /// Enables (or, with `disable`, leaves) maintenance mode on a machine.
    pub fn set_maintenance_mode(&self, machine: &str, disable: bool) -> BackendResult<Value> {
        self.execute(&CommandRequest::set_maintenance_mode(machine, disable))
    }

    /// Shows a message in the session on a machine.
    pub fn send_session_message(
        &self,
        machine: &str,
        title: &str,
        text: &str,
        style: MessageStyle,
    ) -> BackendResult<Value> {
        self.execute(&CommandRequest::send_session_message(
            machine, title, text, style,
        ))
    }

    /// Triggers a power action on a machine.
    pub fn machine_power_action(&self, machine: &str, action: PowerAction) -> BackendResult<Value> {
        self.execute(&CommandRequest::machine_power_action(machine, action))
    }
}
