//! Behaviour both backends must share, exercised through the facade.
//!
//! Every test builds one client per backend answering with the same canned
//! envelope and checks that callers cannot tell them apart.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::thread;

use serde_json::{Value, json};
use serial_test::serial;
use tempfile::TempDir;
use tiny_http::{Response, Server};
use vdictl_backends::{BackendErrorCode, ConnectionTarget, ProcessBackend, ProcessConfig};
use vdictl_client::{BackendSettings, HttpSettings, VdiClient};
use vdictl_protocol::{Command, MessageStyle, PowerAction};

struct Fixture {
    name: &'static str,
    client: VdiClient,
    _dir: Option<TempDir>,
}

/// A process backend whose fake PowerShell prints `stdout`.
fn process_fixture(stdout: &'static str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("stdout.json");
    fs::write(&output, stdout).unwrap();

    let host = dir.path().join("pwsh");
    fs::write(&host, format!("#!/bin/sh\ncat '{}'\n", output.display())).unwrap();
    fs::set_permissions(&host, fs::Permissions::from_mode(0o755)).unwrap();

    let config = ProcessConfig::new(
        "/opt/vdictl/wrapper.ps1",
        ConnectionTarget::AdminAddress("ddc01.example.com".into()),
    )
    .with_executable(host);

    Fixture {
        name: "process",
        client: VdiClient::new(Box::new(ProcessBackend::new(config))),
        _dir: Some(dir),
    }
}

/// An HTTP backend whose server answers every request with `body`.
fn http_fixture(body: &'static str) -> Fixture {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let _ = request.respond(Response::from_string(body));
        }
    });

    let settings = BackendSettings::Http(HttpSettings {
        base_url: format!("http://{}/", addr),
        verify: false,
        use_env_proxy: false,
        ..Default::default()
    });

    Fixture {
        name: "http",
        client: VdiClient::from_settings(&settings).unwrap(),
        _dir: None,
    }
}

fn fixtures(body: &'static str) -> [Fixture; 2] {
    [process_fixture(body), http_fixture(body)]
}

#[test]
#[serial]
fn data_is_returned_verbatim() {
    let body = r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":[{"MachineName":"M1"}]}"#;
    for fixture in fixtures(body) {
        let data = fixture.client.get_machine_status().unwrap();
        assert_eq!(data, json!([{"MachineName": "M1"}]), "{}", fixture.name);
        assert_eq!(fixture.client.backend_name(), fixture.name);
    }
}

#[test]
#[serial]
fn legacy_timestamps_are_normalized() {
    let body = r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":[{"UserName":"bob","SessionStateChangeTime":"/Date(1700000000000)/","StartTime":null}]}"#;
    for fixture in fixtures(body) {
        let data = fixture.client.get_sessions().unwrap();
        assert_eq!(
            data,
            json!([{
                "UserName": "bob",
                "SessionStateChangeTime": "2023-11-14T22:13:20Z",
                "StartTime": null
            }]),
            "{}",
            fixture.name
        );
    }
}

#[test]
#[serial]
fn nonzero_execution_status_is_a_toolstack_error() {
    let body = r#"{"Status":{"ExecutionStatus":1,"ErrorMessage":"x"},"Data":null}"#;
    for fixture in fixtures(body) {
        let err = fixture
            .client
            .machine_power_action("M1", PowerAction::Restart)
            .unwrap_err();
        assert_eq!(err.code(), BackendErrorCode::Toolstack, "{}", fixture.name);
        assert_eq!(err.message(), "x");
        assert_eq!(err.command(), Some(Command::MachinePowerAction));
        assert_eq!(err.backend(), Some(fixture.name));
    }
}

#[test]
#[serial]
fn envelope_without_status_is_a_decode_error() {
    for fixture in fixtures(r#"{"Data":[]}"#) {
        let err = fixture.client.get_access_users("Lab").unwrap_err();
        assert!(err.is_decode(), "{}: {}", fixture.name, err);
    }
}

#[test]
#[serial]
fn envelope_without_data_is_a_decode_error() {
    for fixture in fixtures(r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""}}"#) {
        let err = fixture.client.set_maintenance_mode("m1", false).unwrap_err();
        assert!(err.is_decode(), "{}: {}", fixture.name, err);
    }
}

#[test]
#[serial]
fn missing_arguments_are_configuration_errors() {
    for fixture in fixtures(r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":[]}"#) {
        let err = fixture
            .client
            .send_session_message("m1", "", "text", MessageStyle::Information)
            .unwrap_err();
        assert!(err.is_configuration(), "{}: {}", fixture.name, err);
        assert_eq!(err.command(), Some(Command::SendSessionMessage));
    }
}

#[test]
#[serial]
fn updated_records_come_back_for_actions() {
    let body = r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":["EXAMPLE\\alice","EXAMPLE\\bob"]}"#;
    for fixture in fixtures(body) {
        let data = fixture
            .client
            .set_access_users("Lab", &["EXAMPLE\\bob"], false)
            .unwrap();
        assert_eq!(
            data,
            json!(["EXAMPLE\\alice", "EXAMPLE\\bob"]),
            "{}",
            fixture.name
        );
    }
}

#[test]
#[serial]
fn disconnect_returns_the_session_record() {
    let body = r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":{"SessionState":"Disconnected"}}"#;
    for fixture in fixtures(body) {
        let data = fixture.client.disconnect_session("m1").unwrap();
        assert_eq!(data["SessionState"], "Disconnected", "{}", fixture.name);
    }
}

#[test]
#[serial]
fn http_disconnect_without_session_is_an_empty_record() {
    let fixture =
        http_fixture(r#"{"Status":{"ExecutionStatus":0,"ErrorMessage":""},"Data":null}"#);
    let data = fixture.client.disconnect_session("m1").unwrap();
    assert_eq!(data, Value::Object(Default::default()));
}
