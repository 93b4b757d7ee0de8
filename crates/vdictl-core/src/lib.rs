//! Core helpers shared by the vdictl crates: legacy timestamp parsing and tracing setup.

pub mod time;
pub mod tracing;

pub use self::time::{format_timestamp, is_timestamp_field, parse_legacy_timestamp, TIMESTAMP_FIELD_SUFFIX};
pub use self::tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
