//! Process backend: runs the PowerShell control script once per command.
//!
//! The invocation looks like
//!
//! ```text
//! <powershell> -NonInteractive -NoProfile -File <script>
//!   (-AdminAddress <address> | -JsonConfig <file>) -CommandName <Name>
//!   [<extra args...>] [<command flags...>]
//! ```
//!
//! Exit code 0 and an empty stderr are required; stdout carries the JSON
//! envelope in the host's legacy code page.
//!
//! # Example
//!
//! ```ignore
//! use vdictl_backends::process::{ConnectionTarget, ProcessBackend, ProcessConfig};
//!
//! let config = ProcessConfig::new(
//!     r"C:\vdictl\vdictl-wrapper.ps1",
//!     ConnectionTarget::AdminAddress("ddc01.example.com".into()),
//! );
//! let backend = ProcessBackend::new(config);
//! ```

mod backend;
mod config;

pub use backend::ProcessBackend;
pub use config::{ConnectionTarget, OutputEncoding, ProcessConfig};
