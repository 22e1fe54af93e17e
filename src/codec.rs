//! Versioned byte encoding of frames for stream transport.
//!
//! One encoded frame carries, in order and big-endian: the raw 32 bit id
//! word, the frame flags byte, the payload as a u32-length-prefixed byte
//! sequence, then the receive timestamp as two 64 bit signed integers.
//! Pure functions, no I/O.
//!
//! The version tag is a caller-supplied compatibility marker, not
//! negotiated: producer and consumer of encoded bytes must agree on it
//! (e.g. across a process boundary or a persisted log) or decoding is
//! undefined. Version 1 is the only defined layout.

use std::convert::TryInto;

use crate::constants::CANFD_MAX_DLEN;
use crate::errors::DecodeError;
use crate::frame::{CanFdFrame, Timestamp};

/// The initial (and currently only) wire layout.
pub const DATA_STREAM_V1: u8 = 1;

// id word + flags + payload length prefix
const HEADER_LEN: usize = 4 + 1 + 4;
// two i64 timestamp fields
const TRAILER_LEN: usize = 8 + 8;

/// Encoded size of an empty-payload frame; every encoded frame is this
/// plus its payload length.
pub const MIN_ENCODED_LEN: usize = HEADER_LEN + TRAILER_LEN;

/// Largest possible encoded frame (64 byte FD payload).
pub const MAX_ENCODED_LEN: usize = MIN_ENCODED_LEN + CANFD_MAX_DLEN;

/// Number of bytes `encode` produces for `frame`.
pub fn encoded_len(frame: &CanFdFrame) -> usize {
    MIN_ENCODED_LEN + frame.len()
}

/// Serialize one frame and its receive timestamp.
///
/// Deterministic and total: any constructible frame encodes.
pub fn encode(frame: &CanFdFrame, timestamp: Timestamp, _version: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(frame));

    buf.extend_from_slice(&frame.id_word().to_be_bytes());
    buf.push(frame.flags());
    buf.extend_from_slice(&(frame.len() as u32).to_be_bytes());
    buf.extend_from_slice(frame.data());
    buf.extend_from_slice(&timestamp.sec.to_be_bytes());
    buf.extend_from_slice(&timestamp.usec.to_be_bytes());

    buf
}

/// Reconstruct a frame and timestamp from one encoded frame.
///
/// The buffer must hold exactly one encoded frame: a truncated buffer or
/// a payload length prefix that disagrees with the remaining byte count
/// is rejected.
pub fn decode(buf: &[u8], _version: u8) -> Result<(CanFdFrame, Timestamp), DecodeError> {
    if buf.len() < MIN_ENCODED_LEN {
        return Err(DecodeError::Truncated);
    }

    let id_word = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let flags = buf[4];
    let prefixed = u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]) as usize;

    let actual = buf.len() - MIN_ENCODED_LEN;
    if prefixed != actual {
        return Err(DecodeError::LengthMismatch { prefixed, actual });
    }

    let payload = &buf[HEADER_LEN..HEADER_LEN + prefixed];
    let frame = CanFdFrame::from_raw_parts(id_word, flags, payload)?;

    let trailer = &buf[HEADER_LEN + prefixed..];
    let sec = i64::from_be_bytes(trailer[..8].try_into().unwrap());
    let usec = i64::from_be_bytes(trailer[8..].try_into().unwrap());

    Ok((frame, Timestamp::new(sec, usec)))
}
