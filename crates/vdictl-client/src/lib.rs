//! Client facade, configuration and command-line interface
//!
//! This crate provides [`VdiClient`], the single entry point automation and
//! the `vdictl` binary use to operate the control plane, whichever backend
//! is configured.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use client::VdiClient;
pub use config::{BackendKind, BackendSettings, ClientConfig, HttpSettings, ProcessSettings};
pub use error::{ClientError, ClientResult};
