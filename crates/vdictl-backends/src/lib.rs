//! Backend trait and implementations.
//!
//! This crate provides the transports the vdictl client can drive:
//!
//! - [`Backend`] - The trait every transport implements
//! - [`ProcessBackend`] - Shells out to the privileged PowerShell control script
//! - [`HttpBackend`] - Talks to the remote facade service over HTTP
//! - [`BackendError`] - Typed failures shared by both
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  VdiClient   │
//!                 └──────┬───────┘
//!                        │ Backend
//!          ┌─────────────┴─────────────┐
//!          ▼                           ▼
//! ┌─────────────────┐        ┌─────────────────┐
//! │ ProcessBackend  │        │   HttpBackend   │
//! └────────┬────────┘        └────────┬────────┘
//!          │ argv / stdout            │ GET / POST
//!          ▼                          ▼
//! ┌─────────────────┐        ┌─────────────────┐
//! │ control script  │        │ facade service  │
//! └────────┬────────┘        └────────┬────────┘
//!          └────────────┬─────────────┘
//!                       ▼ decode_envelope()
//!                ┌──────────────┐
//!                │ Data (JSON)  │
//!                └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vdictl_backends::{Backend, HttpBackend, HttpConfig};
//! use vdictl_protocol::CommandRequest;
//!
//! let backend = HttpBackend::connect(HttpConfig::new("http://localhost:8080/")?)?;
//! let machines = backend.execute(&CommandRequest::get_machine_status())?;
//! ```

pub mod backend;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "process")]
pub mod process;

// Re-export main types at crate root
pub use backend::Backend;
pub use error::{BackendError, BackendErrorCode, BackendResult};
#[cfg(feature = "http")]
pub use http::{HttpBackend, HttpConfig};
#[cfg(feature = "process")]
pub use process::{ConnectionTarget, OutputEncoding, ProcessBackend, ProcessConfig};
