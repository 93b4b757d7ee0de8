//! Process backend configuration.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vdictl_protocol::CommandRequest;

use crate::error::{BackendError, BackendResult};

/// Which control-plane instance the script talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionTarget {
    /// Address (IP or FQDN) of the Delivery Controller, passed as `-AdminAddress`.
    AdminAddress(String),
    /// Configuration file read by the script, passed as `-JsonConfig`.
    JsonConfig(PathBuf),
}

impl ConnectionTarget {
    fn args(&self) -> [OsString; 2] {
        match self {
            Self::AdminAddress(address) => ["-AdminAddress".into(), address.into()],
            Self::JsonConfig(path) => ["-JsonConfig".into(), path.into()],
        }
    }
}

/// Text encoding of the script's standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    /// Code page 850, what Windows PowerShell 5.1 writes to a redirected stdout.
    #[default]
    Cp850,
    /// UTF-8, for PowerShell 7 hosts.
    Utf8,
}

impl OutputEncoding {
    /// Decodes captured output bytes.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the bytes are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> BackendResult<String> {
        match self {
            Self::Cp850 => Ok(oem_cp::decode_string_complete_table(
                bytes,
                &oem_cp::code_table::DECODING_TABLE_CP850,
            )),
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| {
                BackendError::decode(format!("output is not valid UTF-8: {}", e)).with_source(e)
            }),
        }
    }
}

/// Configuration for the process backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// PowerShell executable.
    pub executable: PathBuf,
    /// Path of the control script.
    pub script: PathBuf,
    /// Connection target handed to the script.
    pub target: ConnectionTarget,
    /// Encoding of the script's stdout.
    pub encoding: OutputEncoding,
    /// Host-specific flags appended after the command name.
    pub extra_args: Vec<String>,
}

impl ProcessConfig {
    /// Creates a configuration using the platform's default PowerShell executable.
    pub fn new(script: impl Into<PathBuf>, target: ConnectionTarget) -> Self {
        Self {
            executable: Self::default_executable(),
            script: script.into(),
            target,
            encoding: OutputEncoding::default(),
            extra_args: Vec::new(),
        }
    }

    /// Returns the Windows PowerShell executable under `%SYSTEMROOT%`.
    #[cfg(windows)]
    pub fn default_executable() -> PathBuf {
        std::env::var_os("SYSTEMROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Windows"))
            .join("System32")
            .join("WindowsPowerShell")
            .join("v1.0")
            .join("powershell.exe")
    }

    /// Returns `pwsh`, resolved through `PATH` at spawn time.
    #[cfg(not(windows))]
    pub fn default_executable() -> PathBuf {
        PathBuf::from("pwsh")
    }

    /// Sets the PowerShell executable.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Sets the output encoding.
    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the extra host-specific flags.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Builds the argument vector (without the executable) for a request.
    pub fn command_line(&self, request: &CommandRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-NonInteractive".into(),
            "-NoProfile".into(),
            "-File".into(),
            self.script.clone().into(),
        ];
        args.extend(self.target.args());
        args.push("-CommandName".into());
        args.push(request.command().as_str().into());
        args.extend(self.extra_args.iter().map(OsString::from));
        args.extend(request.script_args().into_iter().map(OsString::from));
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdictl_protocol::PowerAction;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn command_line_with_admin_address() {
        let config = ProcessConfig::new(
            "/opt/vdictl/wrapper.ps1",
            ConnectionTarget::AdminAddress("ddc01.example.com".into()),
        );
        let args = config.command_line(&CommandRequest::get_machine_status());
        assert_eq!(
            strings(args),
            vec![
                "-NonInteractive",
                "-NoProfile",
                "-File",
                "/opt/vdictl/wrapper.ps1",
                "-AdminAddress",
                "ddc01.example.com",
                "-CommandName",
                "GetMachineStatus",
            ]
        );
    }

    #[test]
    fn command_line_with_json_config_and_flags() {
        let config = ProcessConfig::new(
            "wrapper.ps1",
            ConnectionTarget::JsonConfig(PathBuf::from("/etc/vdictl/ddc.json")),
        )
        .with_extra_args(vec!["-Dummy".into()]);
        let request = CommandRequest::machine_power_action("m1.example.com", PowerAction::TurnOff);
        let args = strings(config.command_line(&request));
        assert_eq!(
            args[4..],
            [
                "-JsonConfig",
                "/etc/vdictl/ddc.json",
                "-CommandName",
                "MachinePowerAction",
                "-Dummy",
                "-DNSName",
                "m1.example.com",
                "-Action",
                "turnoff",
            ]
        );
    }

    #[test]
    fn cp850_decodes_extended_latin() {
        let text = OutputEncoding::Cp850.decode(b"caf\x82 \x81ber").unwrap();
        assert_eq!(text, "café über");
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        let err = OutputEncoding::Utf8.decode(b"caf\x82").unwrap_err();
        assert!(err.is_decode());
        assert_eq!(OutputEncoding::Utf8.decode("café".as_bytes()).unwrap(), "café");
    }

    #[test]
    fn default_encoding_is_cp850() {
        let config = ProcessConfig::new("x.ps1", ConnectionTarget::AdminAddress("a".into()));
        assert_eq!(config.encoding, OutputEncoding::Cp850);
        assert!(config.extra_args.is_empty());
    }
}
