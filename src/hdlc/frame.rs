//! HDLC-lite frame codec.
//!
//! Wire format:
//! ```text
//! ┌──────┬───────────────────────────────────────────────────┬──────┐
//! │ 0x7E │ escaped( address │ control │ payload │ crc32 LE ) │ 0x7E │
//! └──────┴───────────────────────────────────────────────────┴──────┘
//! ```
//!
//! The CRC covers the unescaped `address‖control‖payload`.  Inside the
//! body, `0x7E` and `0x7D` are replaced by `0x7D, byte ^ 0x20`.  Pure
//! functions over caller-supplied slices: no state, no I/O, no allocation.

use crate::error::{Corruption, FrameError};

use super::crc::Crc32;

/// Frame delimiter.
pub const FLAG: u8 = 0x7E;

/// Escape marker.
pub const ESCAPE: u8 = 0x7D;

/// XOR mask applied to an escaped byte.
pub const ESCAPE_MASK: u8 = 0x20;

/// Control byte for unnumbered information frames (the only kind sent).
pub const UI_CONTROL: u8 = 0x00;

/// Length of the trailing frame check sequence.
pub const CRC_SIZE: usize = 4;

/// Unescaped bytes surrounding the payload: address, control and CRC.
pub const BODY_OVERHEAD: usize = 2 + CRC_SIZE;

/// Largest possible frame for a payload of `payload_len` bytes: two flags
/// plus a body in which every byte needs escaping.
pub const fn max_encoded_len(payload_len: usize) -> usize {
    2 + 2 * (payload_len + BODY_OVERHEAD)
}

/// Largest payload whose worst-case frame fits `buffer_len` bytes.
pub const fn max_payload_len(buffer_len: usize) -> usize {
    buffer_len.saturating_sub(2 + 2 * BODY_OVERHEAD) / 2
}

/// A decoded frame.  `payload` borrows the unescaped output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub address: u8,
    pub control: u8,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Validate an unescaped body (`address‖control‖payload‖crc`).
    pub fn parse(body: &'a [u8]) -> Result<Self, FrameError> {
        if body.len() < BODY_OVERHEAD {
            return Err(Corruption::TooShort.into());
        }
        let (data, fcs) = body.split_at(body.len() - CRC_SIZE);
        let expected = u32::from_le_bytes([fcs[0], fcs[1], fcs[2], fcs[3]]);
        if Crc32::new().update(data).finish() != expected {
            return Err(Corruption::ChecksumMismatch.into());
        }
        Ok(Self {
            address: data[0],
            control: data[1],
            payload: &data[2..],
        })
    }
}

fn needs_escape(byte: u8) -> bool {
    byte == FLAG || byte == ESCAPE
}

fn put(buf: &mut [u8], pos: &mut usize, byte: u8) -> Result<(), FrameError> {
    let slot = buf.get_mut(*pos).ok_or(FrameError::BufferTooSmall)?;
    *slot = byte;
    *pos += 1;
    Ok(())
}

fn put_escaped(buf: &mut [u8], pos: &mut usize, byte: u8) -> Result<(), FrameError> {
    if needs_escape(byte) {
        put(buf, pos, ESCAPE)?;
        put(buf, pos, byte ^ ESCAPE_MASK)
    } else {
        put(buf, pos, byte)
    }
}

/// Encode one frame into `out`, returning the number of bytes written.
pub fn encode(address: u8, control: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    let fcs = Crc32::new()
        .update(&[address, control])
        .update(payload)
        .finish()
        .to_le_bytes();

    let mut pos = 0;
    put(out, &mut pos, FLAG)?;
    put_escaped(out, &mut pos, address)?;
    put_escaped(out, &mut pos, control)?;
    for &byte in payload {
        put_escaped(out, &mut pos, byte)?;
    }
    for byte in fcs {
        put_escaped(out, &mut pos, byte)?;
    }
    put(out, &mut pos, FLAG)?;
    Ok(pos)
}

/// Frame the payload stored at `buf[payload_start..payload_start + len]`
/// into the front of the same buffer.
///
/// The write cursor can run at most `5 + 2i` bytes ahead of the start
/// while reading payload byte `i`, so the payload must begin at least
/// `len + 5` bytes into the buffer for unread bytes to stay intact.
pub fn encode_in_place(
    buf: &mut [u8],
    payload_start: usize,
    len: usize,
    address: u8,
    control: u8,
) -> Result<usize, FrameError> {
    let end = payload_start
        .checked_add(len)
        .filter(|&end| end <= buf.len())
        .ok_or(FrameError::BufferTooSmall)?;
    if payload_start < len + 5 {
        return Err(FrameError::BufferTooSmall);
    }

    let fcs = Crc32::new()
        .update(&[address, control])
        .update(&buf[payload_start..end])
        .finish()
        .to_le_bytes();

    let mut pos = 0;
    put(buf, &mut pos, FLAG)?;
    put_escaped(buf, &mut pos, address)?;
    put_escaped(buf, &mut pos, control)?;
    for src in payload_start..end {
        let byte = buf[src];
        put_escaped(buf, &mut pos, byte)?;
    }
    for byte in fcs {
        put_escaped(buf, &mut pos, byte)?;
    }
    put(buf, &mut pos, FLAG)?;
    Ok(pos)
}

/// Decode one complete frame (flags included) into `out`.
///
/// Any malformed escape, missing delimiter or checksum mismatch rejects the
/// whole frame; `out` contents are unspecified on error.
pub fn decode<'o>(frame: &[u8], out: &'o mut [u8]) -> Result<Frame<'o>, FrameError> {
    let [FLAG, body @ .., FLAG] = frame else {
        return Err(Corruption::MissingDelimiter.into());
    };

    let mut len = 0;
    let mut escaped = false;
    for &byte in body {
        if escaped {
            escaped = false;
            let original = byte ^ ESCAPE_MASK;
            if !needs_escape(original) {
                return Err(Corruption::InvalidEscape.into());
            }
            put(out, &mut len, original)?;
            continue;
        }
        match byte {
            // A bare flag inside the body means the frame was cut short.
            FLAG => return Err(Corruption::MissingDelimiter.into()),
            ESCAPE => escaped = true,
            _ => put(out, &mut len, byte)?,
        }
    }
    if escaped {
        return Err(Corruption::InvalidEscape.into());
    }

    Frame::parse(&out[..len])
}
