//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/vdictl/config.toml` by default:
//!
//! ```toml
//! backend = "http"
//!
//! [process]
//! script = 'C:\vdictl\vdictl-wrapper.ps1'
//! admin_address = "ddc01.example.com"
//!
//! [http]
//! base_url = "https://vdi.example.com/"
//! timeout = 5
//! verify = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use vdictl_backends::{ConnectionTarget, HttpConfig, OutputEncoding, ProcessConfig};

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the vdictl client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Which backend to use.
    pub backend: BackendKind,

    /// Process backend settings.
    pub process: ProcessSettings,

    /// HTTP backend settings.
    pub http: HttpSettings,
}

/// The transport selected at client construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Run the control script locally.
    #[default]
    Process,
    /// Talk to the facade service.
    Http,
}

/// Process backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    /// PowerShell executable; the platform default when unset.
    pub executable: Option<PathBuf>,

    /// Path of the control script.
    pub script: Option<PathBuf>,

    /// Delivery Controller address.
    pub admin_address: Option<String>,

    /// Configuration file handed to the script instead of an address.
    pub json_config: Option<PathBuf>,

    /// Encoding of the script's output.
    pub encoding: OutputEncoding,

    /// Extra flags passed after the command name.
    pub extra_args: Vec<String>,
}

impl ProcessSettings {
    /// Converts to backend configuration.
    ///
    /// Requires a script and exactly one of `admin_address` or `json_config`.
    pub fn to_backend_config(&self) -> Result<ProcessConfig, String> {
        let script = self
            .script
            .as_ref()
            .ok_or_else(|| "[process] script is not set".to_string())?;

        let target = match (&self.admin_address, &self.json_config) {
            (Some(address), None) => ConnectionTarget::AdminAddress(address.clone()),
            (None, Some(path)) => ConnectionTarget::JsonConfig(path.clone()),
            (Some(_), Some(_)) => {
                return Err(
                    "[process] admin_address and json_config are mutually exclusive".to_string(),
                );
            }
            (None, None) => {
                return Err("[process] one of admin_address or json_config is required".to_string());
            }
        };

        let mut config = ProcessConfig::new(script, target)
            .with_encoding(self.encoding)
            .with_extra_args(self.extra_args.clone());
        if let Some(ref executable) = self.executable {
            config = config.with_executable(executable);
        }
        Ok(config)
    }
}

/// HTTP backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Base URL of the facade service.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout: u64,

    /// Whether to check the server version when connecting.
    pub verify: bool,

    /// Whether proxies configured in the environment are used.
    pub use_env_proxy: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: HttpConfig::DEFAULT_BASE_URL.to_string(),
            timeout: HttpConfig::DEFAULT_TIMEOUT_SECS,
            verify: true,
            use_env_proxy: true,
        }
    }
}

impl HttpSettings {
    /// Converts to backend configuration.
    pub fn to_backend_config(&self) -> Result<HttpConfig, String> {
        if self.timeout == 0 {
            return Err("[http] timeout must be at least one second".to_string());
        }

        let mut config = HttpConfig::new(&self.base_url)
            .map_err(|e| format!("[http] invalid base_url '{}': {}", self.base_url, e))?
            .with_timeout(Duration::from_secs(self.timeout))
            .with_verify(self.verify);
        if !self.use_env_proxy {
            config = config.without_env_proxy();
        }
        Ok(config)
    }
}

/// The settings of the selected backend.
#[derive(Debug, Clone)]
pub enum BackendSettings {
    /// Process backend.
    Process(ProcessSettings),
    /// HTTP backend.
    Http(HttpSettings),
}

impl BackendSettings {
    /// Returns which backend these settings configure.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Process(_) => BackendKind::Process,
            Self::Http(_) => BackendKind::Http,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the settings of the selected backend.
    pub fn backend_settings(&self) -> BackendSettings {
        match self.backend {
            BackendKind::Process => BackendSettings::Process(self.process.clone()),
            BackendKind::Http => BackendSettings::Http(self.http.clone()),
        }
    }

    /// Checks that the selected backend is fully configured.
    pub fn validate(&self) -> Result<(), String> {
        match self.backend {
            BackendKind::Process => self.process.to_backend_config().map(drop),
            BackendKind::Http => self.http.to_backend_config().map(drop),
        }
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vdictl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend, BackendKind::Process);
        assert_eq!(config.http.base_url, "http://localhost:8080/");
        assert_eq!(config.http.timeout, 5);
        assert!(config.http.verify);
        assert_eq!(config.process.encoding, OutputEncoding::Cp850);
    }

    #[test]
    fn config_toml_http_backend() {
        let config: ClientConfig = toml::from_str(
            r#"
backend = "http"

[http]
base_url = "https://vdi.example.com/api"
timeout = 10
verify = false
"#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Http);

        let BackendSettings::Http(settings) = config.backend_settings() else {
            panic!("expected http settings");
        };
        let http = settings.to_backend_config().unwrap();
        assert_eq!(http.url_str(), "https://vdi.example.com/api/");
        assert_eq!(http.timeout, Duration::from_secs(10));
        assert!(!http.verify);
    }

    #[test]
    fn config_toml_process_backend() {
        let config: ClientConfig = toml::from_str(
            r#"
[process]
executable = "/usr/bin/pwsh"
script = "/opt/vdictl/wrapper.ps1"
json_config = "/etc/vdictl/ddc.json"
encoding = "utf8"
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let process = config.process.to_backend_config().unwrap();
        assert_eq!(process.executable, PathBuf::from("/usr/bin/pwsh"));
        assert_eq!(
            process.target,
            ConnectionTarget::JsonConfig(PathBuf::from("/etc/vdictl/ddc.json"))
        );
        assert_eq!(process.encoding, OutputEncoding::Utf8);
    }

    #[test]
    fn process_settings_need_script_and_one_target() {
        let mut settings = ProcessSettings::default();
        assert!(settings.to_backend_config().unwrap_err().contains("script"));

        settings.script = Some(PathBuf::from("wrapper.ps1"));
        assert!(settings.to_backend_config().unwrap_err().contains("required"));

        settings.admin_address = Some("ddc01".to_string());
        settings.json_config = Some(PathBuf::from("ddc.json"));
        assert!(settings
            .to_backend_config()
            .unwrap_err()
            .contains("mutually exclusive"));

        settings.json_config = None;
        assert!(settings.to_backend_config().is_ok());
    }

    #[test]
    fn invalid_http_settings_error() {
        let settings = HttpSettings {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(settings.to_backend_config().unwrap_err().contains("base_url"));

        let settings = HttpSettings {
            timeout: 0,
            ..Default::default()
        };
        assert!(settings.to_backend_config().is_err());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result: Result<ClientConfig, _> = toml::from_str(r#"backend = "ssh""#);
        assert!(result.is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = \"http\"\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.backend_settings().kind(), BackendKind::Http);

        let missing = ClientConfig::load_from(&dir.path().join("nope.toml"));
        assert!(missing.unwrap_err().contains("failed to read"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = ClientConfig::default();
        config.process.admin_address = Some("ddc01.example.com".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.process.admin_address.as_deref(), Some("ddc01.example.com"));
    }
}
