//! In-memory channel output for unit tests.

use std::vec::Vec;

use log::error;

use crate::error::OutputError;

use super::channel::ChannelOutput;
use super::packet::Packet;

/// Records every sent buffer as one encoded packet.
pub struct TestOutput<const N: usize> {
    buffer: [u8; N],
    acquired: bool,
    sent: Vec<Vec<u8>>,
}

impl<const N: usize> TestOutput<N> {
    pub fn new() -> Self {
        Self {
            buffer: [0; N],
            acquired: false,
            sent: Vec::new(),
        }
    }

    pub fn packet_count(&self) -> usize {
        self.sent.len()
    }

    pub fn sent(&self, index: usize) -> &[u8] {
        &self.sent[index]
    }

    pub fn packet(&self, index: usize) -> Packet<'_> {
        Packet::decode(&self.sent[index]).unwrap()
    }

    pub fn last_packet(&self) -> Option<Packet<'_>> {
        self.sent.last().map(|bytes| Packet::decode(bytes).unwrap())
    }
}

impl<const N: usize> ChannelOutput for TestOutput<N> {
    fn name(&self) -> &str {
        "test"
    }

    fn buffer_size(&self) -> usize {
        N
    }

    fn acquire_buffer(&mut self) -> Result<&mut [u8], OutputError> {
        if self.acquired {
            error!("test output: buffer acquired twice");
            return Err(OutputError::BufferInUse);
        }
        self.acquired = true;
        Ok(&mut self.buffer)
    }

    fn send_and_release_buffer(&mut self, len: usize) -> Result<(), OutputError> {
        if !self.acquired {
            return Err(OutputError::NotAcquired);
        }
        self.acquired = false;
        let bytes = self.buffer.get(..len).ok_or(OutputError::TooLarge)?;
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn discard_buffer(&mut self) {
        self.acquired = false;
    }
}
