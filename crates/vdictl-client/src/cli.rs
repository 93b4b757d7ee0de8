//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use vdictl_core::TracingOutputFormat;
use vdictl_protocol::{MessageStyle, PowerAction};

use crate::config::{BackendKind, ClientConfig};

/// vdictl - Operate the virtual desktop control plane
#[derive(Debug, Parser)]
#[command(name = "vdictl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "VDICTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    // --- Backend overrides ---
    /// Backend to use
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendKind>,

    /// Base URL of the facade service (selects the HTTP backend)
    #[arg(long, env = "VDICTL_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Delivery Controller address (selects the process backend)
    #[arg(long, global = true)]
    pub admin_address: Option<String>,

    /// Skip the server version check
    #[arg(long, global = true)]
    pub no_verify: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    ///
    /// `--base-url` and `--admin-address` select their backend unless
    /// `--backend` says otherwise.
    pub fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(ref url) = self.base_url {
            config.http.base_url = url.clone();
            config.backend = BackendKind::Http;
        }
        if let Some(ref address) = self.admin_address {
            config.process.admin_address = Some(address.clone());
            config.process.json_config = None;
            config.backend = BackendKind::Process;
        }
        if self.no_verify {
            config.http.verify = false;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line logs
    Compact,
    /// Multi-line human-readable logs
    Pretty,
    /// JSON lines
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Compact => Self::Compact,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Json => Self::Json,
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all machines
    GetMachineStatus,

    /// List all sessions
    GetSessions,

    /// Disconnect the session on a machine
    DisconnectSession {
        /// Machine FQDN
        machine: String,
    },

    /// List the users entitled to a delivery group
    GetAccessUsers {
        /// Delivery group name
        group: String,
    },

    /// Grant or revoke delivery group access
    SetAccessUsers {
        /// Delivery group name
        group: String,

        /// User names (comma-separated or repeated)
        #[arg(required = true, value_delimiter = ',')]
        users: Vec<String>,

        /// Revoke access instead of granting it
        #[arg(long)]
        remove: bool,
    },

    /// Enable or leave maintenance mode on a machine
    SetMaintenanceMode {
        /// Machine FQDN
        machine: String,

        /// Leave maintenance mode instead of entering it
        #[arg(long)]
        disable: bool,
    },

    /// Show a message in the session on a machine
    SendSessionMessage {
        /// Machine FQDN
        machine: String,

        /// Message title
        #[arg(long)]
        title: String,

        /// Message text
        #[arg(long)]
        text: String,

        /// Message style (information, exclamation, critical, question)
        #[arg(long, default_value = "Information")]
        style: MessageStyle,
    },

    /// Trigger a power action on a machine
    MachinePowerAction {
        /// Machine FQDN
        machine: String,

        /// Power action (reset, restart, resume, shutdown, suspend, turnoff, turnon)
        action: PowerAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
