//! HTTP backend configuration.

use std::time::Duration;
use url::Url;

/// Configuration for the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Base URL of the facade service, always ending in `/`.
    pub base_url: Url,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether to run the version probe when connecting.
    pub verify: bool,

    /// Version string announced to the version gate.
    pub client_version: String,

    /// User agent string.
    pub user_agent: String,

    /// Whether `HTTP_PROXY`/`HTTPS_PROXY` from the environment are honoured.
    pub use_env_proxy: bool,
}

impl HttpConfig {
    /// Base URL used when none is configured.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8080/";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

    /// Creates a new HTTP configuration with the given base URL.
    ///
    /// A trailing slash is appended to the path if missing, so that command
    /// names resolve below the base rather than replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            verify: true,
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            user_agent: format!("vdictl/{}", env!("CARGO_PKG_VERSION")),
            use_env_proxy: true,
        })
    }

    /// Creates a configuration for the default local facade service.
    pub fn localhost() -> Result<Self, url::ParseError> {
        Self::new(Self::DEFAULT_BASE_URL)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the version probe.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Overrides the version announced to the version gate.
    pub fn with_client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = version.into();
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Ignores proxies configured in the environment.
    pub fn without_env_proxy(mut self) -> Self {
        self.use_env_proxy = false;
        self
    }

    /// Returns the base URL as a string.
    pub fn url_str(&self) -> &str {
        self.base_url.as_str()
    }
}
