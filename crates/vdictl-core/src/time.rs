//! Legacy timestamp handling.
//!
//! Windows PowerShell up to 5.1 serializes timestamps with `ConvertTo-Json` as
//! strings of the form `/Date(<ms-since-epoch>)/`. This module recognizes those
//! strings and turns them into proper [`DateTime<Utc>`] values.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;

/// Suffix identifying members that carry a timestamp (`LastConnectionTime`, ...).
pub const TIMESTAMP_FIELD_SUFFIX: &str = "Time";

/// `/Date(1700000000000)/`, optionally with a `+hhmm` / `-hhmm` offset that is ignored.
static LEGACY_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/Date\((\d+)(?:[+-]\d{4})?\)/$").expect("Invalid legacy date regex")
});

/// Returns true if a member with this name is expected to hold a timestamp.
pub fn is_timestamp_field(key: &str) -> bool {
    key.ends_with(TIMESTAMP_FIELD_SUFFIX)
}

/// Parses a legacy `/Date(<ms>)/` string.
///
/// Only the first ten digits are used, interpreted as whole seconds since the
/// Unix epoch. Returns `None` for anything not matching the legacy pattern.
///
/// # Example
///
/// ```rust
/// use vdictl_core::parse_legacy_timestamp;
///
/// let ts = parse_legacy_timestamp("/Date(1700000000000)/").unwrap();
/// assert_eq!(ts.timestamp(), 1_700_000_000);
/// assert!(parse_legacy_timestamp("2023-11-14").is_none());
/// ```
pub fn parse_legacy_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let captures = LEGACY_DATE_REGEX.captures(value)?;
    let digits = captures.get(1)?.as_str();
    let seconds: i64 = digits[..digits.len().min(10)].parse().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// Renders a timestamp the way normalized records carry it (RFC 3339, UTC).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
