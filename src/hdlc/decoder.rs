//! Streaming HDLC frame decoder.
//!
//! A single `Transport::read` may return part of a frame, several frames,
//! or line noise between frames.  The decoder consumes one byte at a time,
//! unescaping into a fixed-capacity buffer, and yields a result each time a
//! closing flag arrives.

use heapless::Vec;

use crate::error::{Corruption, FrameError};

use super::frame::{ESCAPE, ESCAPE_MASK, FLAG, Frame};

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Discarding bytes until the first flag.
    Hunting,
    /// Inside a frame body.
    Body,
    /// Previous byte was the escape marker.
    Escape,
    /// Frame is already known bad; skip to the next flag and report it.
    Discard(FrameError),
}

/// Byte-at-a-time decoder holding at most `N` unescaped body bytes.
///
/// The closing flag of one frame also opens the next, so back-to-back
/// frames may share a delimiter.
pub struct FrameDecoder<const N: usize> {
    state: DecoderState,
    buffer: Vec<u8, N>,
    /// The buffer still holds the last yielded frame.
    stale: bool,
}

impl<const N: usize> FrameDecoder<N> {
    pub const fn new() -> Self {
        Self {
            state: DecoderState::Hunting,
            buffer: Vec::new(),
            stale: false,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some` when a closing flag completes a non-empty frame.  The
    /// returned payload borrows the decoder and is valid until the next call.
    pub fn feed(&mut self, byte: u8) -> Option<Result<Frame<'_>, FrameError>> {
        if self.stale {
            self.buffer.clear();
            self.stale = false;
        }

        if byte == FLAG {
            return self.finish_frame();
        }

        match self.state {
            DecoderState::Hunting | DecoderState::Discard(_) => {}
            DecoderState::Body if byte == ESCAPE => self.state = DecoderState::Escape,
            DecoderState::Body => self.push(byte),
            DecoderState::Escape => {
                let original = byte ^ ESCAPE_MASK;
                if original == FLAG || original == ESCAPE {
                    self.state = DecoderState::Body;
                    self.push(original);
                } else {
                    self.state = DecoderState::Discard(Corruption::InvalidEscape.into());
                }
            }
        }
        None
    }

    /// Discard any partial frame and hunt for the next flag.
    pub fn reset(&mut self) {
        self.state = DecoderState::Hunting;
        self.buffer.clear();
        self.stale = false;
    }

    /// Whether bytes of an unfinished frame are buffered.
    pub fn in_frame(&self) -> bool {
        match self.state {
            DecoderState::Hunting => false,
            DecoderState::Body => !self.stale && !self.buffer.is_empty(),
            DecoderState::Escape | DecoderState::Discard(_) => true,
        }
    }

    fn push(&mut self, byte: u8) {
        if self.buffer.push(byte).is_err() {
            self.state = DecoderState::Discard(FrameError::BufferTooSmall);
        }
    }

    fn finish_frame(&mut self) -> Option<Result<Frame<'_>, FrameError>> {
        let previous = core::mem::replace(&mut self.state, DecoderState::Body);
        match previous {
            DecoderState::Hunting => None,
            // Back-to-back flags delimit nothing.
            DecoderState::Body if self.buffer.is_empty() => None,
            DecoderState::Body => {
                self.stale = true;
                Some(Frame::parse(&self.buffer))
            }
            DecoderState::Escape => {
                self.buffer.clear();
                Some(Err(Corruption::InvalidEscape.into()))
            }
            DecoderState::Discard(e) => {
                self.buffer.clear();
                Some(Err(e))
            }
        }
    }
}

impl<const N: usize> Default for FrameDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}
