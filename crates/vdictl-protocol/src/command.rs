//! Command names, parameter table and request construction.
//!
//! | Command | Parameters | Result |
//! |---|---|---|
//! | `GetMachineStatus` | | list of machine records |
//! | `GetSessions` | | list of session records |
//! | `DisconnectSession` | machine | session record or empty |
//! | `GetAccessUsers` | group | list of user identifiers |
//! | `SetAccessUsers` | group, users, disable | updated list |
//! | `SetMaintenanceMode` | machine, disable | updated machine record |
//! | `SendSessionMessage` | machine, title, text, style | none |
//! | `MachinePowerAction` | machine, action | updated machine record |
//!
//! The table lives in [`Command::params`]; both the process flags and the HTTP
//! body keys are derived from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, ProtocolResult};

/// A control-plane command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// List all machines with their registration and power state.
    GetMachineStatus,
    /// List all sessions.
    GetSessions,
    /// Disconnect the session on a machine.
    DisconnectSession,
    /// List users entitled to a delivery group.
    GetAccessUsers,
    /// Grant or revoke delivery group access.
    SetAccessUsers,
    /// Toggle maintenance mode on a machine.
    SetMaintenanceMode,
    /// Pop up a message in the session on a machine.
    SendSessionMessage,
    /// Trigger a power action on a machine.
    MachinePowerAction,
}

/// How the network backend transports a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read-only command, parameters travel in the path.
    Get,
    /// Action command, parameters travel as a flat JSON body.
    Post,
}

/// A named command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Machine FQDN.
    Machine,
    /// Delivery group name.
    Group,
    /// Comma-separated user names.
    Users,
    /// Remove access / leave maintenance mode instead of the opposite.
    Disable,
    /// Message title.
    Title,
    /// Message body.
    Text,
    /// Message style, see [`MessageStyle`].
    Style,
    /// Power action, see [`PowerAction`].
    Action,
}

impl Param {
    /// Returns the parameter name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Group => "group",
            Self::Users => "users",
            Self::Disable => "disable",
            Self::Title => "title",
            Self::Text => "text",
            Self::Style => "style",
            Self::Action => "action",
        }
    }

    /// Returns true for boolean switches.
    pub fn is_switch(&self) -> bool {
        matches!(self, Self::Disable)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// The parameter.
    pub param: Param,
    /// Flag passed to the control script.
    pub flag: &'static str,
    /// Key in the JSON body sent to the facade service.
    pub key: &'static str,
}

const fn spec(param: Param, flag: &'static str, key: &'static str) -> ParamSpec {
    ParamSpec { param, flag, key }
}

const MACHINE: ParamSpec = spec(Param::Machine, "-DNSName", "DNSName");
const GROUP: ParamSpec = spec(Param::Group, "-Group", "Group");
const USERS: ParamSpec = spec(Param::Users, "-UserNames", "UserNames");
const REMOVE_ACCESS: ParamSpec = spec(Param::Disable, "-Disable", "RemoveAccess");
const DISABLE_MAINTENANCE: ParamSpec = spec(Param::Disable, "-Disable", "Disable");
const TITLE: ParamSpec = spec(Param::Title, "-Title", "Title");
const TEXT: ParamSpec = spec(Param::Text, "-Text", "Text");
const STYLE: ParamSpec = spec(Param::Style, "-MessageStyle", "MessageStyle");
const ACTION: ParamSpec = spec(Param::Action, "-Action", "Action");

impl Command {
    /// Every command, in table order.
    pub const ALL: [Command; 8] = [
        Self::GetMachineStatus,
        Self::GetSessions,
        Self::DisconnectSession,
        Self::GetAccessUsers,
        Self::SetAccessUsers,
        Self::SetMaintenanceMode,
        Self::SendSessionMessage,
        Self::MachinePowerAction,
    ];

    /// Returns the wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetMachineStatus => "GetMachineStatus",
            Self::GetSessions => "GetSessions",
            Self::DisconnectSession => "DisconnectSession",
            Self::GetAccessUsers => "GetAccessUsers",
            Self::SetAccessUsers => "SetAccessUsers",
            Self::SetMaintenanceMode => "SetMaintenanceMode",
            Self::SendSessionMessage => "SendSessionMessage",
            Self::MachinePowerAction => "MachinePowerAction",
        }
    }

    /// Returns the parameters of the command, all required, in wire order.
    pub fn params(&self) -> &'static [ParamSpec] {
        match self {
            Self::GetMachineStatus | Self::GetSessions => &[],
            Self::DisconnectSession => &[MACHINE],
            Self::GetAccessUsers => &[GROUP],
            Self::SetAccessUsers => &[GROUP, USERS, REMOVE_ACCESS],
            Self::SetMaintenanceMode => &[MACHINE, DISABLE_MAINTENANCE],
            Self::SendSessionMessage => &[MACHINE, TITLE, TEXT, STYLE],
            Self::MachinePowerAction => &[MACHINE, ACTION],
        }
    }

    /// Returns the HTTP method used by the network backend.
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::GetMachineStatus | Self::GetSessions | Self::GetAccessUsers => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Returns the parameter appended to the URL path of a GET request.
    pub fn path_param(&self) -> Option<Param> {
        match self {
            Self::GetAccessUsers => Some(Param::Group),
            _ => None,
        }
    }

    /// Returns false for fire-and-forget commands whose response has no body.
    pub fn has_payload(&self) -> bool {
        !matches!(self, Self::SendSessionMessage)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

/// Icon of a session pop-up message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageStyle {
    Information,
    Exclamation,
    Critical,
    Question,
}

impl MessageStyle {
    /// Every style.
    pub const ALL: [MessageStyle; 4] = [
        Self::Information,
        Self::Exclamation,
        Self::Critical,
        Self::Question,
    ];

    /// Returns the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Information => "Information",
            Self::Exclamation => "Exclamation",
            Self::Critical => "Critical",
            Self::Question => "Question",
        }
    }
}

impl fmt::Display for MessageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStyle {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::UnknownValue {
                kind: "message style",
                value: s.to_string(),
            })
    }
}

/// Machine power action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Reset,
    Restart,
    Resume,
    Shutdown,
    Suspend,
    TurnOff,
    TurnOn,
}

impl PowerAction {
    /// Every action.
    pub const ALL: [PowerAction; 7] = [
        Self::Reset,
        Self::Restart,
        Self::Resume,
        Self::Shutdown,
        Self::Suspend,
        Self::TurnOff,
        Self::TurnOn,
    ];

    /// Returns the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Restart => "restart",
            Self::Resume => "resume",
            Self::Shutdown => "shutdown",
            Self::Suspend => "suspend",
            Self::TurnOff => "turnoff",
            Self::TurnOn => "turnon",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerAction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::UnknownValue {
                kind: "power action",
                value: s.to_string(),
            })
    }
}

/// Value of a command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Plain string argument.
    Text(String),
    /// Boolean switch.
    Switch(bool),
}

/// A command together with its named arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    command: Command,
    params: Vec<(Param, ParamValue)>,
}

impl CommandRequest {
    /// Creates a request without arguments.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            params: Vec::new(),
        }
    }

    /// Sets a text argument, replacing any previous value.
    pub fn with_text(self, param: Param, value: impl Into<String>) -> Self {
        self.with_value(param, ParamValue::Text(value.into()))
    }

    /// Sets a switch argument, replacing any previous value.
    pub fn with_switch(self, param: Param, on: bool) -> Self {
        self.with_value(param, ParamValue::Switch(on))
    }

    fn with_value(mut self, param: Param, value: ParamValue) -> Self {
        self.params.retain(|(p, _)| *p != param);
        self.params.push((param, value));
        self
    }

    /// Creates a `GetMachineStatus` request.
    pub fn get_machine_status() -> Self {
        Self::new(Command::GetMachineStatus)
    }

    /// Creates a `GetSessions` request.
    pub fn get_sessions() -> Self {
        Self::new(Command::GetSessions)
    }

    /// Creates a `DisconnectSession` request.
    pub fn disconnect_session(machine: impl Into<String>) -> Self {
        Self::new(Command::DisconnectSession).with_text(Param::Machine, machine)
    }

    /// Creates a `GetAccessUsers` request.
    pub fn get_access_users(group: impl Into<String>) -> Self {
        Self::new(Command::GetAccessUsers).with_text(Param::Group, group)
    }

    /// Creates a `SetAccessUsers` request; `users` is a comma-separated list.
    pub fn set_access_users(
        group: impl Into<String>,
        users: impl Into<String>,
        disable: bool,
    ) -> Self {
        Self::new(Command::SetAccessUsers)
            .with_text(Param::Group, group)
            .with_text(Param::Users, users)
            .with_switch(Param::Disable, disable)
    }

    /// Creates a `SetMaintenanceMode` request.
    pub fn set_maintenance_mode(machine: impl Into<String>, disable: bool) -> Self {
        Self::new(Command::SetMaintenanceMode)
            .with_text(Param::Machine, machine)
            .with_switch(Param::Disable, disable)
    }

    /// Creates a `SendSessionMessage` request.
    pub fn send_session_message(
        machine: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        style: MessageStyle,
    ) -> Self {
        Self::new(Command::SendSessionMessage)
            .with_text(Param::Machine, machine)
            .with_text(Param::Title, title)
            .with_text(Param::Text, text)
            .with_text(Param::Style, style.as_str())
    }

    /// Creates a `MachinePowerAction` request.
    pub fn machine_power_action(machine: impl Into<String>, action: PowerAction) -> Self {
        Self::new(Command::MachinePowerAction)
            .with_text(Param::Machine, machine)
            .with_text(Param::Action, action.as_str())
    }

    /// Returns the command.
    pub fn command(&self) -> Command {
        self.command
    }

    /// Returns the value of a parameter, if set.
    pub fn get(&self, param: Param) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, value)| value)
    }

    /// Returns the value of a text parameter, if set.
    pub fn text(&self, param: Param) -> Option<&str> {
        match self.get(param) {
            Some(ParamValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Checks the arguments against the command's parameter table.
    ///
    /// # Errors
    ///
    /// Fails if a required argument is absent or an empty string, if an
    /// argument has the wrong kind, or if it is not part of the table.
    pub fn validate(&self) -> ProtocolResult<()> {
        let command = self.command;
        let table = command.params();

        for (param, _) in &self.params {
            if !table.iter().any(|s| s.param == *param) {
                return Err(ProtocolError::UnexpectedParameter {
                    command,
                    param: *param,
                });
            }
        }

        for spec in table {
            let param = spec.param;
            match self.get(param) {
                None => return Err(ProtocolError::MissingParameter { command, param }),
                Some(ParamValue::Text(_)) if param.is_switch() => {
                    return Err(ProtocolError::InvalidParameterType { command, param });
                }
                Some(ParamValue::Switch(_)) if !param.is_switch() => {
                    return Err(ProtocolError::InvalidParameterType { command, param });
                }
                Some(ParamValue::Text(s)) if s.trim().is_empty() => {
                    return Err(ProtocolError::MissingParameter { command, param });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Returns the command-specific script flags in table order.
    ///
    /// Switches are emitted as bare flags, and only when set.
    pub fn script_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for spec in self.command.params() {
            match self.get(spec.param) {
                Some(ParamValue::Text(value)) => {
                    args.push(spec.flag.to_string());
                    args.push(value.clone());
                }
                Some(ParamValue::Switch(true)) => args.push(spec.flag.to_string()),
                Some(ParamValue::Switch(false)) | None => {}
            }
        }
        args
    }

    /// Returns the flat JSON body for a POST request, keys in table order.
    pub fn json_body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        for spec in self.command.params() {
            match self.get(spec.param) {
                Some(ParamValue::Text(value)) => {
                    body.insert(spec.key.to_string(), Value::String(value.clone()));
                }
                Some(ParamValue::Switch(on)) => {
                    body.insert(spec.key.to_string(), Value::Bool(*on));
                }
                None => {}
            }
        }
        body
    }
}
