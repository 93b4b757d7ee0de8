//! HTTP backend: talks to the remote facade service.
//!
//! Read-only commands are `GET <base>/<CommandName>` (plus a percent-encoded
//! group for `GetAccessUsers`), actions are `POST <base>/<CommandName>` with a
//! flat JSON body. Connecting probes `GET <base>/version` and refuses servers
//! whose `major.minor` differs from the client's, unless verification is off.
//!
//! # Example
//!
//! ```ignore
//! use vdictl_backends::http::{HttpBackend, HttpConfig};
//!
//! let config = HttpConfig::new("https://vdi.example.com/")?;
//! let backend = HttpBackend::connect(config)?;
//! println!("server runs {:?}", backend.server_version());
//! ```

mod backend;
mod client;
mod config;

pub use backend::HttpBackend;
pub use config::HttpConfig;
