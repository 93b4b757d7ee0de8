//! vdictl CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use vdictl_client::cli::{Cli, Command, ConfigAction};
use vdictl_client::commands;
use vdictl_client::config::ClientConfig;
use vdictl_client::error::{ClientError, ClientResult};
use vdictl_client::VdiClient;
use vdictl_core::tracing::{TracingConfig, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = TracingConfig::from_verbosity(cli.verbose).with_format(cli.log_format.into());
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ClientResult<()> {
    let path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = if cli.config.is_some() {
        ClientConfig::load_from(&path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };
    cli.apply_overrides(&mut config);

    if let Command::Config { ref action } = cli.command {
        return match action {
            ConfigAction::Dump => commands::config::dump(&config, &path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&path),
        };
    }

    let client = VdiClient::from_settings(&config.backend_settings())?;
    if let Some(data) = commands::control::execute(&client, &cli.command)? {
        commands::control::print(&data)?;
    }
    Ok(())
}
