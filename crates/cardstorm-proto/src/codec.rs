//! Length-prefixed JSON framing.
//!
//! Layout on the wire: `[length: u32 big-endian] + [JSON bytes]`. The
//! length counts the JSON bytes only. Readers must validate the length
//! prefix with [`check_frame_len`] before allocating, so a hostile
//! peer cannot force an oversized buffer.

use bytes::{BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};

use crate::errors::{ProtocolError, Result};

/// Maximum size of one encoded event, excluding the length prefix.
///
/// Card plays and state snapshots are small; 64 KiB leaves generous
/// headroom for effect lists while bounding per-connection buffering.
pub const MAX_EVENT_SIZE: usize = 64 * 1024;

/// Size of the length prefix in bytes.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Encode an event as a length-prefixed JSON frame.
pub fn encode_event<T: Serialize>(event: &T) -> Result<BytesMut> {
    let json = serde_json::to_vec(event)?;
    if json.len() > MAX_EVENT_SIZE {
        return Err(ProtocolError::EventTooLarge(json.len()));
    }

    let mut buf = BytesMut::with_capacity(LEN_PREFIX_SIZE + json.len());
    buf.put_u32(json.len() as u32);
    buf.put_slice(&json);
    Ok(buf)
}

/// Validate a frame length read from the wire.
///
/// Returns the length as `usize` so the caller can allocate exactly
/// that much.
pub fn check_frame_len(len: u32) -> Result<usize> {
    let len = len as usize;
    if len > MAX_EVENT_SIZE {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    Ok(len)
}

/// Decode the JSON body of a frame (the bytes after the length
/// prefix).
pub fn decode_event<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.len() > MAX_EVENT_SIZE {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    Ok(serde_json::from_slice(body)?)
}
