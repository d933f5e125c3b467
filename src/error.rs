//! Error classification shared by every layer.
//!
//! Each subsystem keeps its own error enum (`PoolError`, `CatalogError`,
//! `TenantError`); all of them map onto the closed [`ErrorKind`] set so callers
//! can branch on retry-worthiness without matching every variant.

use std::fmt;

/// Closed set of failure conditions a caller must branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad pool bounds. Construction-time, never retried.
    Specification,
    /// The pool was drained. Discard the pool instance.
    Drained,
    /// The pool is full. Back off and retry.
    AtCapacity,
    /// The allocator produced no connection for this reservation.
    Unavailable,
    /// Identity service unreachable. Retried up to the attempt limit.
    Connection,
    /// Rejected credentials, malformed catalog, unsupported version.
    Protocol,
    /// No route: the tenant cache is not initialized or knows no such region.
    NoRoute,
}

impl ErrorKind {
    /// Whether the same call may succeed later without reconfiguration.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::AtCapacity | ErrorKind::Unavailable | ErrorKind::Connection
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Specification => "specification",
            ErrorKind::Drained => "drained",
            ErrorKind::AtCapacity => "at_capacity",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Connection => "connection",
            ErrorKind::Protocol => "protocol",
            ErrorKind::NoRoute => "no_route",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
