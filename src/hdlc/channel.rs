//! HDLC channel output: frames each released payload onto a [`Transport`].
//!
//! One `[u8; N]` scratch buffer serves both as the payload region handed to
//! the encoder and as the frame output.  The payload region sits at the tail
//! of the buffer and is framed forward into the head, so a release costs no
//! copy and exactly one sink write.

use heapless::String;
use log::{error, warn};

use crate::config::LinkConfig;
use crate::error::{OutputError, Result};
use crate::rpc::channel::ChannelOutput;
use crate::transport::Transport;

use super::frame::{self, UI_CONTROL};

/// Bytes of channel name kept for diagnostics.
pub const NAME_CAPACITY: usize = 32;

pub struct HdlcChannelOutput<W: Transport, const N: usize> {
    writer: W,
    buffer: [u8; N],
    address: u8,
    name: String<NAME_CAPACITY>,
    acquired: bool,
}

impl<W: Transport, const N: usize> HdlcChannelOutput<W, N> {
    /// Names longer than [`NAME_CAPACITY`] bytes are truncated.
    pub fn new(writer: W, address: u8, name: &str) -> Self {
        let mut truncated = String::new();
        for c in name.chars() {
            if truncated.push(c).is_err() {
                break;
            }
        }
        Self {
            writer,
            buffer: [0; N],
            address,
            name: truncated,
            acquired: false,
        }
    }

    /// Fails with [`crate::Error::Config`] if `config` does not validate.
    pub fn from_config(writer: W, config: &LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(writer, config.hdlc_address, &config.channel_name))
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    const fn payload_capacity() -> usize {
        frame::max_payload_len(N)
    }

    const fn payload_start() -> usize {
        N - Self::payload_capacity()
    }

    fn write_frame(&mut self, len: usize) -> core::result::Result<(), OutputError> {
        let start = Self::payload_start();
        let n = frame::encode_in_place(&mut self.buffer, start, len, self.address, UI_CONTROL)?;

        if self.writer.write_space() < n {
            warn!("HDLC[{}]: sink full, dropping {}-byte frame", self.name, n);
            return Err(OutputError::SinkFull);
        }
        match self.writer.write(&self.buffer[..n]) {
            Ok(written) if written == n => Ok(()),
            Ok(written) => {
                warn!("HDLC[{}]: short write {}/{}", self.name, written, n);
                Err(OutputError::Transport)
            }
            Err(e) => {
                warn!("HDLC[{}]: write failed: {:?}", self.name, e);
                Err(OutputError::Transport)
            }
        }
    }
}

impl<W: Transport, const N: usize> ChannelOutput for HdlcChannelOutput<W, N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn buffer_size(&self) -> usize {
        Self::payload_capacity()
    }

    fn acquire_buffer(&mut self) -> core::result::Result<&mut [u8], OutputError> {
        if self.acquired {
            error!("HDLC[{}]: buffer acquired while already in use", self.name);
            return Err(OutputError::BufferInUse);
        }
        self.acquired = true;
        Ok(&mut self.buffer[Self::payload_start()..])
    }

    fn send_and_release_buffer(&mut self, len: usize) -> core::result::Result<(), OutputError> {
        if !self.acquired {
            error!("HDLC[{}]: release without acquire", self.name);
            return Err(OutputError::NotAcquired);
        }
        self.acquired = false;
        if len > Self::payload_capacity() {
            return Err(OutputError::TooLarge);
        }
        self.write_frame(len)
    }

    fn discard_buffer(&mut self) {
        self.acquired = false;
    }
}
