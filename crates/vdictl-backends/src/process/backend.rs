//! Process backend implementation.

use std::process::{Command as ProcessCommand, Stdio};
use std::time::Instant;

use serde_json::Value;
use tracing::{Span, debug, info_span};
use vdictl_protocol::{CommandRequest, decode_envelope};

use crate::backend::{Backend, envelope_data};
use crate::error::{BackendError, BackendResult};

use super::config::ProcessConfig;

/// Backend executing commands through the PowerShell control script.
///
/// Exactly one process is spawned per call and waited for without a timeout:
/// a hanging script blocks the caller.
#[derive(Debug)]
pub struct ProcessBackend {
    config: ProcessConfig,
    span: Span,
}

impl ProcessBackend {
    /// Backend name used in errors and logs.
    pub const NAME: &'static str = "process";

    /// Creates a new process backend.
    pub fn new(config: ProcessConfig) -> Self {
        let span = info_span!("backend", kind = Self::NAME);
        Self::with_span(config, span)
    }

    /// Creates a new process backend logging under the given span.
    pub fn with_span(config: ProcessConfig, span: Span) -> Self {
        span.in_scope(|| {
            debug!(
                executable = %config.executable.display(),
                script = %config.script.display(),
                target = ?config.target,
                "using PowerShell control script"
            );
        });
        Self { config, span }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Runs the script and returns its stdout, validating exit code and stderr.
    fn run(&self, request: &CommandRequest) -> BackendResult<Vec<u8>> {
        let executable = &self.config.executable;
        let mut command = ProcessCommand::new(executable);
        command
            .args(self.config.command_line(request))
            .stdin(Stdio::null());
        debug!(command = ?command, "spawning control script");

        let started = Instant::now();
        let output = command.output().map_err(|e| {
            BackendError::transport(format!("failed to run {}: {}", executable.display(), e))
                .with_source(e)
        })?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            status = %output.status,
            "control script finished"
        );

        if !output.status.success() {
            return Err(BackendError::transport(format!(
                "control script exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // stderr is a failure signal even with a zero exit code
        if !output.stderr.is_empty() {
            return Err(BackendError::transport(format!(
                "control script wrote to stderr: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }

    fn decode(&self, stdout: &[u8]) -> BackendResult<Value> {
        let started = Instant::now();
        let text = self.config.encoding.decode(stdout)?;
        debug!(elapsed_us = started.elapsed().as_micros() as u64, "decoded stdout");

        let started = Instant::now();
        let envelope = decode_envelope(&text).map_err(|e| {
            debug!(output = %text, "undecodable control script output");
            BackendError::from(e)
        })?;
        debug!(elapsed_us = started.elapsed().as_micros() as u64, "parsed envelope");

        envelope_data(envelope)
    }
}

impl Backend for ProcessBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn execute(&self, request: &CommandRequest) -> BackendResult<Value> {
        let _guard = self.span.enter();
        let command = request.command();

        request
            .validate()
            .map_err(BackendError::from)
            .and_then(|()| self.run(request))
            .and_then(|stdout| self.decode(&stdout))
            .map_err(|e| e.with_backend(Self::NAME).with_command(command))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use serde_json::json;
    use serial_test::serial;
    use tempfile::TempDir;
    use vdictl_protocol::{Command, MessageStyle};

    use super::*;
    use crate::error::BackendErrorCode;
    use crate::process::{ConnectionTarget, OutputEncoding};

    const OK_MACHINES: &str =
        r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":[{"MachineName":"M1"}]}"#;

    /// Writes an executable shell script standing in for PowerShell.
    fn fake_host(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("pwsh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn printing(dir: &Path, stdout: &str) -> PathBuf {
        fake_host(dir, &format!("cat <<'JSON'\n{}\nJSON", stdout))
    }

    fn backend(executable: PathBuf) -> ProcessBackend {
        let config = ProcessConfig::new(
            "/opt/vdictl/wrapper.ps1",
            ConnectionTarget::AdminAddress("ddc01.example.com".into()),
        )
        .with_executable(executable);
        ProcessBackend::new(config)
    }

    #[test]
    #[serial]
    fn returns_data_section() {
        let dir = TempDir::new().unwrap();
        let backend = backend(printing(dir.path(), OK_MACHINES));

        let data = backend
            .execute(&CommandRequest::get_machine_status())
            .unwrap();
        assert_eq!(data, json!([{"MachineName": "M1"}]));
    }

    #[test]
    #[serial]
    fn passes_argument_vector() {
        let dir = TempDir::new().unwrap();
        let args_file = dir.path().join("args.txt");
        let script = format!(
            "printf '%s\\n' \"$@\" > '{}'\ncat <<'JSON'\n{}\nJSON",
            args_file.display(),
            r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":null}"#
        );
        let backend = backend(fake_host(dir.path(), &script));

        let request = CommandRequest::send_session_message(
            "m1.example.com",
            "Reboot",
            "Saving your work is advised",
            MessageStyle::Exclamation,
        );
        assert_eq!(backend.execute(&request).unwrap(), Value::Null);

        let recorded = fs::read_to_string(&args_file).unwrap();
        let args: Vec<&str> = recorded.lines().collect();
        assert_eq!(
            args,
            vec![
                "-NonInteractive",
                "-NoProfile",
                "-File",
                "/opt/vdictl/wrapper.ps1",
                "-AdminAddress",
                "ddc01.example.com",
                "-CommandName",
                "SendSessionMessage",
                "-DNSName",
                "m1.example.com",
                "-Title",
                "Reboot",
                "-Text",
                "Saving your work is advised",
                "-MessageStyle",
                "Exclamation",
            ]
        );
    }

    #[test]
    #[serial]
    fn stderr_output_fails_even_with_zero_exit() {
        let dir = TempDir::new().unwrap();
        let script = format!("echo 'WARNING: snap-in loaded' >&2\ncat <<'JSON'\n{}\nJSON", OK_MACHINES);
        let backend = backend(fake_host(dir.path(), &script));

        let err = backend
            .execute(&CommandRequest::get_machine_status())
            .unwrap_err();
        assert_eq!(err.code(), BackendErrorCode::Transport);
        assert!(err.message().contains("snap-in loaded"));
        assert_eq!(err.command(), Some(Command::GetMachineStatus));
        assert_eq!(err.backend(), Some("process"));
    }

    #[test]
    #[serial]
    fn nonzero_exit_is_a_transport_error() {
        let dir = TempDir::new().unwrap();
        let backend = backend(fake_host(dir.path(), "exit 3"));

        let err = backend.execute(&CommandRequest::get_sessions()).unwrap_err();
        assert!(err.is_transport());
        assert!(err.message().contains("exited"));
    }

    #[test]
    #[serial]
    fn missing_executable_is_a_transport_error() {
        let dir = TempDir::new().unwrap();
        let backend = backend(dir.path().join("does-not-exist"));

        let err = backend.execute(&CommandRequest::get_sessions()).unwrap_err();
        assert!(err.is_transport());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    #[serial]
    fn execution_status_becomes_toolstack_error() {
        let dir = TempDir::new().unwrap();
        let backend = backend(printing(
            dir.path(),
            r#"{"Status":{"ExecutionStatus":1,"ErrorMessage":"x"},"Data":[]}"#,
        ));

        let err = backend
            .execute(&CommandRequest::disconnect_session("m1"))
            .unwrap_err();
        assert!(err.is_toolstack());
        assert_eq!(err.message(), "x");
        assert_eq!(err.command(), Some(Command::DisconnectSession));
    }

    #[test]
    #[serial]
    fn malformed_output_is_a_decode_error() {
        for stdout in [
            "this is not json",
            r#"{"Data": []}"#,
            r#"{"Status": {"ExecutionStatus": 0, "ErrorMessage": ""}}"#,
        ] {
            let dir = TempDir::new().unwrap();
            let backend = backend(printing(dir.path(), stdout));
            let err = backend.execute(&CommandRequest::get_sessions()).unwrap_err();
            assert!(err.is_decode(), "{stdout}: {err}");
        }
    }

    #[test]
    #[serial]
    fn cp850_output_is_decoded() {
        let dir = TempDir::new().unwrap();
        let script = r#"printf '{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":["caf\202"]}'"#;
        let backend = backend(fake_host(dir.path(), script));

        let data = backend
            .execute(&CommandRequest::get_access_users("Lab"))
            .unwrap();
        assert_eq!(data, json!(["café"]));
    }

    #[test]
    #[serial]
    fn invalid_utf8_output_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let script = r#"printf '{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":["caf\202"]}'"#;
        let config = ProcessConfig::new("wrapper.ps1", ConnectionTarget::AdminAddress("a".into()))
            .with_executable(fake_host(dir.path(), script))
            .with_encoding(OutputEncoding::Utf8);

        let err = ProcessBackend::new(config)
            .execute(&CommandRequest::get_sessions())
            .unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn missing_parameter_is_rejected_before_spawning() {
        let backend = backend(PathBuf::from("/nonexistent/pwsh"));
        let err = backend
            .execute(&CommandRequest::new(Command::MachinePowerAction))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
