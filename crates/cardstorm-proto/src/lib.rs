//! Cardstorm wire protocol.
//!
//! Defines the typed events exchanged between game clients and the
//! coordination server, the payload structs they carry, and the framing
//! codec that puts them on a stream.
//!
//! # Wire format
//!
//! Every event is a JSON object `{"event": "<name>", "data": {...}}`,
//! framed as a 4-byte big-endian length prefix followed by the JSON
//! bytes. Field names are camelCase on the wire. The server never
//! interprets game payloads (HP, shields, card effects) - they are
//! relayed verbatim; only the envelope and routing fields are
//! authoritative.
//!
//! # Invariants
//!
//! - Each event variant maps to exactly one wire tag (enforced by serde
//!   rename attributes and verified by tests).
//! - Encoding an event and decoding the result produces an equivalent
//!   value.
//! - Frames larger than [`codec::MAX_EVENT_SIZE`] are rejected on both
//!   encode and decode.

pub mod codec;
mod errors;
mod events;
mod id;
mod payloads;

pub use errors::{ErrorCode, ProtocolError, Result};
pub use events::{CardPlayBroadcast, ClientEvent, ServerEvent};
pub use id::RoomId;
pub use payloads::{
    CardPlay, RoomStateKind, RoomSummary, RoomView, SlotView, StateSnapshot, TurnSnapshot,
};

/// ALPN protocol identifier for the QUIC transport.
pub const ALPN_PROTOCOL: &[u8] = b"cardstorm";
