//! HTTP backend implementation.

use serde_json::{Map, Value};
use tracing::{Span, debug, info_span, warn};
use vdictl_protocol::{Command, CommandRequest, HttpMethod, check_compatibility};

use crate::backend::{Backend, envelope_data};
use crate::error::{BackendError, BackendResult};

use super::client::{HttpClient, expect_ok, read_envelope, read_status};
use super::config::HttpConfig;

/// Path of the version probe, relative to the base URL.
const VERSION_PATH: &str = "version";

/// Backend talking to the facade service over HTTP.
#[derive(Debug)]
pub struct HttpBackend {
    client: HttpClient,
    config: HttpConfig,
    server_version: Option<String>,
    span: Span,
}

impl HttpBackend {
    /// Backend name used in errors and logs.
    pub const NAME: &'static str = "http";

    /// Connects to the facade service and probes its version.
    ///
    /// With verification disabled the probe is best-effort: an incompatible
    /// version or a failed probe is only logged.
    ///
    /// # Errors
    ///
    /// When verifying, returns a transport or decode error if the version
    /// probe fails, and a configuration error if the server version is
    /// incompatible.
    pub fn connect(config: HttpConfig) -> BackendResult<Self> {
        let span = info_span!("backend", kind = Self::NAME, url = %config.base_url);
        Self::connect_with_span(config, span)
    }

    /// Same as [`connect`](Self::connect), logging under the given span.
    pub fn connect_with_span(config: HttpConfig, span: Span) -> BackendResult<Self> {
        let guard = span.enter();
        let client = HttpClient::new(&config).map_err(|e| e.with_backend(Self::NAME))?;

        let server_version = if config.verify {
            Some(verify_version(&client, &config).map_err(|e| e.with_backend(Self::NAME))?)
        } else {
            probe_version(&client, &config)
        };

        drop(guard);
        Ok(Self {
            client,
            config,
            server_version,
            span,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Returns the version reported by the server, if the probe succeeded.
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    fn request_path(request: &CommandRequest) -> String {
        let command = request.command();
        match command.path_param().and_then(|param| request.text(param)) {
            Some(segment) => format!("{}/{}", command, urlencoding::encode(segment)),
            None => command.to_string(),
        }
    }

    fn call(&self, request: &CommandRequest) -> BackendResult<Value> {
        request.validate()?;

        let command = request.command();
        let path = Self::request_path(request);
        let response = match command.method() {
            HttpMethod::Get => self.client.get(&path)?,
            HttpMethod::Post => self.client.post(&path, &request.json_body())?,
        };
        let response = expect_ok(response)?;

        if !command.has_payload() {
            debug!(command = %command, "no payload expected, skipping body");
            return Ok(Value::Null);
        }

        let data = envelope_data(read_envelope(response)?)?;
        if command == Command::DisconnectSession && data.is_null() {
            debug!("no active session, returning an empty record");
            return Ok(Value::Object(Map::new()));
        }
        Ok(data)
    }
}

fn fetch_server_version(client: &HttpClient) -> BackendResult<String> {
    let status = read_status(expect_ok(client.get(VERSION_PATH)?)?)?;
    status
        .server_version
        .ok_or_else(|| BackendError::decode("version response carries no 'ServerVersion'"))
}

fn verify_version(client: &HttpClient, config: &HttpConfig) -> BackendResult<String> {
    let server_version = fetch_server_version(client)?;
    if !check_compatibility(&config.client_version, &server_version).is_compatible() {
        return Err(BackendError::configuration(format!(
            "server version {} is incompatible with client version {}",
            server_version, config.client_version
        )));
    }
    Ok(server_version)
}

fn probe_version(client: &HttpClient, config: &HttpConfig) -> Option<String> {
    match fetch_server_version(client) {
        Ok(server_version) => {
            let compatibility = check_compatibility(&config.client_version, &server_version);
            warn!(
                server = %server_version,
                client = %config.client_version,
                ?compatibility,
                "skipping version check"
            );
            Some(server_version)
        }
        Err(e) => {
            warn!(url = %config.base_url, error = %e, "version probe failed, skipping version check");
            None
        }
    }
}

impl Backend for HttpBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn execute(&self, request: &CommandRequest) -> BackendResult<Value> {
        let _guard = self.span.enter();
        self.call(request)
            .map_err(|e| e.with_backend(Self::NAME).with_command(request.command()))
    }
}
