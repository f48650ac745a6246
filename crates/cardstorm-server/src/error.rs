//! Runtime error types.

use std::fmt;

use crate::server_error::DriverError;

/// Errors that can occur in the server runtime.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (invalid bind address, missing TLS certs,
    /// etc.).
    ///
    /// Fatal; prevents server startup. Fix configuration and restart.
    Config(String),

    /// Transport/network error (connection failure, I/O error, etc.).
    ///
    /// May be transient (network issues) or fatal (bind address in
    /// use). Check error message for details.
    Transport(String),

    /// Protocol error (malformed frame, oversized event, bad JSON).
    ///
    /// A client sent garbage. Fatal for that connection; the server
    /// continues serving other clients.
    Protocol(String),

    /// Internal error (unexpected state, logic bug).
    ///
    /// Should never happen in a correct implementation.
    Internal(String),

    /// Driver error (from game driver processing).
    Driver(DriverError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Driver(err) => write!(f, "driver error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Driver(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DriverError> for ServerError {
    fn from(err: DriverError) -> Self {
        Self::Driver(err)
    }
}

impl From<cardstorm_proto::ProtocolError> for ServerError {
    fn from(err: cardstorm_proto::ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}
