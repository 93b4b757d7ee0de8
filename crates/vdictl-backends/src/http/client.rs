//! Blocking HTTP client for the facade service.
//!
//! This module handles the transport details shared by every command:
//! - URL resolution below the base address
//! - GET and POST with a flat JSON body
//! - Mapping transport failures and non-200 statuses onto [`BackendError`]

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};
use url::Url;
use vdictl_protocol::{ResponseEnvelope, Status, decode_status, from_slice_normalized};

use crate::error::{BackendError, BackendResult};

use super::config::HttpConfig;

/// HTTP client bound to the facade's base URL.
#[derive(Debug)]
pub(crate) struct HttpClient {
    /// The underlying HTTP client.
    client: Client,
    /// Base URL, ending in `/`.
    base_url: Url,
}

impl HttpClient {
    /// Creates a new client with the given configuration.
    pub(crate) fn new(config: &HttpConfig) -> BackendResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| {
            BackendError::configuration(format!("failed to create HTTP client: {}", e))
                .with_source(e)
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Performs a GET request on a path relative to the base URL.
    pub(crate) fn get(&self, path: &str) -> BackendResult<Response> {
        let url = self.url(path)?;
        trace!(method = "GET", url = %url, "sending request");
        self.send(self.client.get(url))
    }

    /// Performs a POST request with a JSON body on a path relative to the base URL.
    pub(crate) fn post(&self, path: &str, body: &Map<String, Value>) -> BackendResult<Response> {
        let url = self.url(path)?;
        trace!(method = "POST", url = %url, body = ?body, "sending request");
        self.send(self.client.post(url).json(body))
    }

    fn url(&self, path: &str) -> BackendResult<Url> {
        self.base_url.join(path).map_err(|e| {
            BackendError::configuration(format!("invalid request path '{}': {}", path, e))
                .with_source(e)
        })
    }

    fn send(&self, request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().map_err(transport_error)?;
        trace!(status = %response.status(), "received response");
        Ok(response)
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    BackendError::transport(message).with_source(e)
}

fn read_body(response: Response) -> BackendResult<Vec<u8>> {
    response
        .bytes()
        .map(|bytes| bytes.to_vec())
        .map_err(|e| {
            let message = if e.is_timeout() {
                "request timeout".to_string()
            } else {
                format!("failed to read response: {}", e)
            };
            BackendError::transport(message).with_source(e)
        })
}

/// Passes a 200 response through; anything else becomes a toolstack error.
///
/// The body of a failed response must still carry a `Status` block, otherwise
/// a decode error is raised.
pub(crate) fn expect_ok(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = read_body(response)?;
    let server_status = decode_status(&body).map_err(|e| {
        debug!(
            http_status = %status,
            body = %String::from_utf8_lossy(&body),
            "undecodable error response"
        );
        BackendError::decode(format!("unexpected status {} without a status block: {}", status, e))
            .with_source(e)
    })?;
    log_failed_status(status, &server_status);

    let message = match server_status.error_message() {
        "" => format!("HTTP {}", status),
        message => message.to_string(),
    };
    Err(BackendError::toolstack(message))
}

fn log_failed_status(http_status: StatusCode, status: &Status) {
    warn!(
        http_status = %http_status,
        execution_status = status.execution_status,
        error_message = %status.error_message(),
        server_version = ?status.server_version,
        timestamp = ?status.timestamp,
        "request failed"
    );
}

/// Reads and decodes the `{Status, Data}` envelope of a response.
pub(crate) fn read_envelope(response: Response) -> BackendResult<ResponseEnvelope> {
    let body = read_body(response)?;
    let value = from_slice_normalized(&body).map_err(|e| {
        debug!(body = %String::from_utf8_lossy(&body), "undecodable response");
        BackendError::decode(format!("failed to parse response: {}", e)).with_source(e)
    })?;
    ResponseEnvelope::from_value(value).map_err(BackendError::from)
}

/// Reads only the `Status` block of a response.
pub(crate) fn read_status(response: Response) -> BackendResult<Status> {
    let body = read_body(response)?;
    decode_status(&body).map_err(BackendError::from)
}
