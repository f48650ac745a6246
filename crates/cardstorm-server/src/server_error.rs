//! Driver error types.
//!
//! Errors from the sans-IO game driver. Client-facing failures
//! (`RoomError` codes) never appear here - the driver turns those into
//! caller-only `room:error` actions. What remains are session
//! bookkeeping failures and internal bugs.

use std::fmt;

use crate::{recorder::RecorderError, room::RoomError};

/// Errors that can occur during driver event processing.
#[derive(Debug)]
pub enum DriverError {
    /// Session not found in registry.
    ///
    /// An event arrived for a connection the driver never accepted, or
    /// one that already closed. May be transient during disconnect
    /// races.
    SessionNotFound(u64),

    /// Room operation failed in a way the driver did not translate to
    /// a client error.
    ///
    /// See `RoomError` for the cause.
    Room(RoomError),

    /// The match recorder rejected a result.
    Recorder(RecorderError),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::Room(err) => write!(f, "room error: {err}"),
            Self::Recorder(err) => write!(f, "recorder error: {err}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Room(err) => Some(err),
            Self::Recorder(err) => Some(err),
            Self::SessionNotFound(_) => None,
        }
    }
}

impl From<RoomError> for DriverError {
    fn from(err: RoomError) -> Self {
        Self::Room(err)
    }
}

impl From<RecorderError> for DriverError {
    fn from(err: RecorderError) -> Self {
        Self::Recorder(err)
    }
}
