//! Unified error type.

use std::fmt;

/// The error type returned by trellis's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed as HTTP
/// responses, not as `Error`s. This type surfaces infrastructure failures
/// (binding a port, accepting a connection) and configuration mistakes
/// caught while the route table is being built.
#[derive(Debug)]
pub enum Error {
    /// Socket-level failure while binding or serving.
    Io(std::io::Error),
    /// A structurally identical pattern is already registered.
    ///
    /// `/a/:x` and `/a/:y` land on the same tree node and conflict even
    /// though the parameter names differ.
    RouteConflict { pattern: String, existing: String },
    /// A `*name` segment appeared somewhere other than the final position.
    WildcardNotLast { pattern: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::RouteConflict { pattern, existing } => {
                write!(f, "pattern `{pattern}` conflicts with registered pattern `{existing}`")
            }
            Self::WildcardNotLast { pattern } => {
                write!(f, "wildcard segment must be last in `{pattern}`")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
