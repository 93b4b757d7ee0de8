//! Client/server version compatibility.
//!
//! Versions are `major.minor.patch` with an optional `-<pre>` suffix. The
//! suffix never takes part in the comparison:
//!
//! | client vs server | result |
//! |---|---|
//! | same `major.minor.patch` | [`Compatibility::Exact`] |
//! | same `major.minor`, other `patch` | [`Compatibility::PatchMismatch`] (warning) |
//! | anything else, or unparsable | [`Compatibility::Incompatible`] |

use std::fmt;
use std::str::FromStr;

use tracing::{debug, error, info, trace, warn};

use crate::error::ProtocolError;

/// A parsed version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTuple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release tag, `"0"` when absent.
    pub pre: String,
}

impl VersionTuple {
    /// The `pre` value used when a version has no `-<pre>` suffix.
    pub const NO_PRE: &'static str = "0";

    /// Returns `(major, minor, patch)`.
    pub fn release(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionTuple {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ProtocolError::InvalidVersion {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let (release, pre) = match trimmed.split_once('-') {
            Some((release, pre)) => (release, pre),
            None => (trimmed, Self::NO_PRE),
        };

        let parts: Vec<&str> = release.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(invalid("expected major.minor.patch"));
        };
        let number = |part: &str| {
            part.parse::<u64>()
                .map_err(|_| invalid(&format!("'{}' is not a number", part)))
        };

        Ok(Self {
            major: number(*major)?,
            minor: number(*minor)?,
            patch: number(*patch)?,
            pre: pre.to_string(),
        })
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.pre != Self::NO_PRE {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

/// Outcome of comparing client and server versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    /// Same `major.minor.patch`.
    Exact,
    /// Same `major.minor`, differing patch level.
    PatchMismatch,
    /// Different `major.minor`, or a version could not be parsed.
    Incompatible,
}

impl Compatibility {
    /// Returns true unless the versions are incompatible.
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Self::Incompatible)
    }

    /// Compares two parsed versions.
    pub fn between(client: &VersionTuple, server: &VersionTuple) -> Self {
        if client.release() == server.release() {
            Self::Exact
        } else if (client.major, client.minor) == (server.major, server.minor) {
            Self::PatchMismatch
        } else {
            Self::Incompatible
        }
    }
}

/// Compares the client's version string with the server's.
///
/// A parse failure on either side yields [`Compatibility::Incompatible`].
pub fn check_compatibility(client: &str, server: &str) -> Compatibility {
    trace!(client = %client, server = %server, "comparing versions");

    let server_version = match server.parse::<VersionTuple>() {
        Ok(v) => v,
        Err(e) => {
            warn!(server = %server, error = %e, "unable to parse server version");
            return Compatibility::Incompatible;
        }
    };
    let client_version = match client.parse::<VersionTuple>() {
        Ok(v) => v,
        Err(e) => {
            warn!(client = %client, error = %e, "unable to parse client version");
            return Compatibility::Incompatible;
        }
    };
    debug!(client = %client_version, server = %server_version, "parsed versions");

    let result = Compatibility::between(&client_version, &server_version);
    match result {
        Compatibility::Exact => info!(version = %server_version, "versions are matching"),
        Compatibility::PatchMismatch => warn!(
            client = %client_version,
            server = %server_version,
            "versions are differing in PATCH level"
        ),
        Compatibility::Incompatible => error!(
            client = %client_version,
            server = %server_version,
            "version mismatch"
        ),
    }
    result
}
