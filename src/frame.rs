//! Length-prefixed frame detection.
//!
//! Bytes arrive from a connection in arbitrary chunks; the checker splits
//! them into whole frames without ever consuming a partial one. Each frame
//! is emitted *including* its 4-byte length prefix; the envelope decoder
//! re-reads it.

use std::collections::VecDeque;

use byteorder::{BigEndian, ByteOrder};
use tracing::{error, trace};

use crate::{MessageHeader, NonContiguousBuffer};

/// The outcome of a [`check_frames`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketVerdict {
    /// At least one whole frame was emitted to the output queue.
    Full,

    /// More bytes are needed; the input buffer is untouched beyond any
    /// whole frames already removed.
    Less,

    /// The framing is corrupt and the connection must be torn down. The
    /// input buffer is in an indeterminate state.
    Err,
}

/// Splits `input` into complete frames appended to `out`.
///
/// Frames are emitted in arrival order, prefix included. The loop stops as
/// soon as the buffer no longer holds a whole frame; a length prefix that
/// is negative or exceeds [`MessageHeader::MAX_FRAME_SIZE`] yields
/// [`PacketVerdict::Err`].
///
/// The checker keeps no state of its own, so one instance of the caller's
/// buffer per connection is the only requirement.
pub fn check_frames(
    input: &mut NonContiguousBuffer,
    out: &mut VecDeque<NonContiguousBuffer>,
) -> PacketVerdict {
    loop {
        let total = input.byte_size();
        if total < MessageHeader::PREFIX_LEN {
            trace!(total, "awaiting frame length prefix");
            break;
        }

        let mut prefix = [0u8; MessageHeader::PREFIX_LEN];
        if input.flatten_to(&mut prefix).is_err() {
            break;
        }
        let frame_size = BigEndian::read_i32(&prefix);

        if frame_size < 0 || frame_size > MessageHeader::MAX_FRAME_SIZE {
            error!(
                frame_size,
                max = MessageHeader::MAX_FRAME_SIZE,
                "frame length prefix out of bounds"
            );
            return PacketVerdict::Err;
        }

        let want = MessageHeader::PREFIX_LEN + frame_size as usize;
        if total < want {
            trace!(total, want, "awaiting frame body");
            break;
        }

        match input.cut(want) {
            Ok(frame) => out.push_back(frame),
            Err(_) => return PacketVerdict::Err,
        }
    }

    if out.is_empty() {
        PacketVerdict::Less
    } else {
        PacketVerdict::Full
    }
}
