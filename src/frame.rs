//! Length-prefixed framing for the SMPP byte stream.
//!
//! Every PDU starts with a big-endian `command_length` that counts itself,
//! so the stream is self-delimiting: accumulate bytes, and as soon as the
//! buffer holds `command_length` bytes, one complete frame can be split off
//! with the next frame starting immediately after it.

use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// Size of the fixed PDU header, and therefore the smallest legal frame.
pub const MIN_FRAME_LEN: usize = 16;

/// Largest frame worth buffering. A length beyond this is stream corruption
/// or a hostile peer, not a message.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// A length prefix outside `[MIN_FRAME_LEN, MAX_FRAME_LEN]`. There is no way
/// to resynchronise a stream after this; the session must close.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("frame length {0} outside the allowed range 16..=65536")]
pub struct FramingError(pub u32);

/// Accumulator splitting inbound bytes into complete PDU frames.
#[derive(Debug, Default)]
pub struct Framer {
    buffer: BytesMut,
}

impl Framer {
    pub fn new() -> Framer {
        Framer {
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Append inbound bytes to the buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet handed out as frames.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    // The socket read path appends straight into the buffer to avoid a copy
    // through `feed`.
    pub(crate) fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Split off the next complete frame, or `None` until enough bytes have
    /// arrived. A successful pop removes exactly `command_length` bytes, so
    /// the buffer then starts at the next PDU boundary.
    pub fn pop(&mut self) -> Result<Option<Bytes>, FramingError> {
        if self.buffer.len() < MIN_FRAME_LEN {
            return Ok(None);
        }

        let command_length = u32::from_be_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]);
        let frame_len = command_length as usize;

        if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&frame_len) {
            return Err(FramingError(command_length));
        }

        if self.buffer.len() < frame_len {
            return Ok(None);
        }

        Ok(Some(self.buffer.split_to(frame_len).freeze()))
    }
}
