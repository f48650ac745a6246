//! Protocol error types and client-facing error codes.

use serde::{Deserialize, Serialize};

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from encoding or decoding wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Event exceeds the maximum frame size.
    #[error("event of {0} bytes exceeds maximum frame size")]
    EventTooLarge(usize),

    /// Frame length prefix claims more bytes than allowed.
    #[error("frame length {0} exceeds maximum frame size")]
    FrameTooLarge(usize),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Room identifier was not a valid hex string.
    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),
}

/// Client-facing error codes carried by `room:error` events.
///
/// These are the only failures ever surfaced to a client. They are
/// reported to the acting client alone and never broadcast - each one
/// reflects either a stale lobby snapshot or an out-of-turn action, not
/// a change of room state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The referenced room no longer exists (stale lobby view).
    RoomNotFound,
    /// The room's guest slot is already occupied (stale lobby view).
    RoomFull,
    /// The acting connection does not hold the current turn.
    NotYourTurn,
}

impl ErrorCode {
    /// Canonical human-readable message for this code.
    pub const fn message(self) -> &'static str {
        match self {
            Self::RoomNotFound => "room does not exist",
            Self::RoomFull => "room is full",
            Self::NotYourTurn => "it is not your turn",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_use_wire_names() {
        let json = serde_json::to_string(&ErrorCode::NotYourTurn).ok();
        assert_eq!(json.as_deref(), Some("\"NOT_YOUR_TURN\""));

        let json = serde_json::to_string(&ErrorCode::RoomNotFound).ok();
        assert_eq!(json.as_deref(), Some("\"ROOM_NOT_FOUND\""));
    }
}
