//! Control-plane commands.

use serde_json::Value;

use crate::cli::Command;
use crate::client::VdiClient;
use crate::error::{ClientError, ClientResult};

/// Runs a control-plane subcommand and returns its `Data`.
///
/// Returns `None` for configuration subcommands, which do not talk to a backend.
pub fn execute(client: &VdiClient, command: &Command) -> ClientResult<Option<Value>> {
    let data = match command {
        Command::GetMachineStatus => client.get_machine_status(),
        Command::GetSessions => client.get_sessions(),
        Command::DisconnectSession { machine } => client.disconnect_session(machine),
        Command::GetAccessUsers { group } => client.get_access_users(group),
        Command::SetAccessUsers {
            group,
            users,
            remove,
        } => client.set_access_users(group, users, *remove),
        Command::SetMaintenanceMode { machine, disable } => {
            client.set_maintenance_mode(machine, *disable)
        }
        Command::SendSessionMessage {
            machine,
            title,
            text,
            style,
        } => client.send_session_message(machine, title, text, *style),
        Command::MachinePowerAction { machine, action } => {
            client.machine_power_action(machine, *action)
        }
        Command::Config { .. } => return Ok(None),
    }?;
    Ok(Some(data))
}

/// Prints `Data` as pretty JSON; nothing is printed for an empty payload.
pub fn print(data: &Value) -> ClientResult<()> {
    if data.is_null() {
        return Ok(());
    }
    let rendered = serde_json::to_string_pretty(data)
        .map_err(|e| ClientError::Output(format!("failed to render JSON: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
