//! Recording channel output and shared test messages.
//!
//! `RecordingOutput` keeps every released buffer as one encoded packet so
//! tests can assert on the full reply history without framing.

use hdlcrpc::error::OutputError;
use hdlcrpc::rpc::message;
use hdlcrpc::rpc::{Channel, ChannelOutput, Packet};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use serde::{Deserialize, Serialize};

// ── Messages ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub integer: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResponse {
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

/// Encode `msg` as a request payload.
pub fn payload<T: Serialize>(msg: &T) -> Vec<u8> {
    let mut buf = [0u8; 64];
    let n = message::encode(msg, &mut buf).unwrap();
    buf[..n].to_vec()
}

// ── RecordingOutput ───────────────────────────────────────────

pub struct RecordingOutput<const N: usize> {
    buffer: [u8; N],
    acquired: bool,
    pub sent: Vec<Vec<u8>>,
}

#[allow(dead_code)]
impl<const N: usize> RecordingOutput<N> {
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

    pub fn packet(&self, index: usize) -> Packet<'_> {
        Packet::decode(&self.sent[index]).unwrap()
    }

    pub fn last_packet(&self) -> Option<Packet<'_>> {
        self.sent.last().map(|b| Packet::decode(b).unwrap())
    }
}

impl<const N: usize> ChannelOutput for RecordingOutput<N> {
    fn name(&self) -> &str {
        "recording"
    }

    fn buffer_size(&self) -> usize {
        N
    }

    fn acquire_buffer(&mut self) -> Result<&mut [u8], OutputError> {
        if self.acquired {
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
        self.sent.push(self.buffer[..len].to_vec());
        Ok(())
    }

    fn discard_buffer(&mut self) {
        self.acquired = false;
    }
}

/// Single-context channel over a recording output.
pub type TestChannel<const N: usize> = Channel<NoopRawMutex, RecordingOutput<N>>;

pub fn test_channel<const N: usize>(id: u32) -> TestChannel<N> {
    Channel::new(id, RecordingOutput::new())
}
