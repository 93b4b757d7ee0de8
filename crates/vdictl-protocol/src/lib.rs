//! Command protocol shared by every vdictl backend.
//!
//! This crate owns the vocabulary both transports speak:
//!
//! - [`Command`] - the closed set of control-plane commands and their parameter table
//! - [`CommandRequest`] - a command plus its named arguments
//! - [`ResponseEnvelope`] - the `{Status, Data}` wrapper returned by the toolstack,
//!   decoded through a hook that normalizes legacy `/Date(...)/` timestamps
//! - [`VersionTuple`] / [`check_compatibility`] - the client/server version gate
//!
//! # Example
//!
//! ```rust
//! use vdictl_protocol::{Command, CommandRequest, PowerAction};
//!
//! let request = CommandRequest::machine_power_action("M1", PowerAction::Restart);
//! assert_eq!(request.command(), Command::MachinePowerAction);
//! assert!(request.validate().is_ok());
//! ```

mod command;
mod envelope;
mod error;
mod version;

pub use command::{
    Command, CommandRequest, HttpMethod, MessageStyle, Param, ParamSpec, ParamValue, PowerAction,
};
pub use envelope::{
    NormalizedValue, ResponseEnvelope, Status, decode_envelope, decode_status, from_slice_normalized,
    from_str_normalized,
};
pub use error::{ProtocolError, ProtocolResult};
pub use version::{Compatibility, VersionTuple, check_compatibility};
