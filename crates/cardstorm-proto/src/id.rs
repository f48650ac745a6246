//! Room identity.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::errors::ProtocolError;

/// Opaque room identifier.
///
/// Generated from the environment RNG at room creation, so it is
/// collision-resistant for the lifetime of the process (room state is
/// never persisted, so no cross-restart uniqueness is needed). On the
/// wire and in logs it appears as a 32-character lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(u128);

impl RoomId {
    /// Wrap a raw 128-bit identifier.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw 128-bit value.
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the exact form Display emits: 32 lowercase hex digits.
        // from_str_radix alone would also take short, uppercase, and
        // sign-prefixed strings, letting distinct spellings alias one id.
        if s.len() != 32 || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ProtocolError::InvalidRoomId(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidRoomId(s.to_string()))
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_hex_round_trip() {
        let id = RoomId::new(0x1234_5678_90ab_cdef_1234_5678_90ab_cdef);
        let text = id.to_string();
        assert_eq!(text, "1234567890abcdef1234567890abcdef");
        assert_eq!(text.parse::<RoomId>().ok(), Some(id));
    }

    #[test]
    fn room_id_serializes_as_string() {
        let id = RoomId::new(7);
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"00000000000000000000000000000007\""));
    }

    #[test]
    fn room_id_rejects_garbage() {
        assert!("not-hex".parse::<RoomId>().is_err());
        assert!("".parse::<RoomId>().is_err());
    }

    #[test]
    fn room_id_accepts_only_canonical_form() {
        let id = RoomId::new(0xdead_beef);
        assert_eq!(id.to_string().parse::<RoomId>().ok(), Some(id));

        // Same value, non-canonical spellings.
        assert!("deadbeef".parse::<RoomId>().is_err());
        assert!("+00000000000000000000000deadbeef".parse::<RoomId>().is_err());
        assert!("000000000000000000000000DEADBEEF".parse::<RoomId>().is_err());
    }
}
