//! Inbound side of an HDLC RPC link.
//!
//! Bytes from the transport go through a [`FrameDecoder`]; frames addressed
//! to this link are handed to the RPC server as packets.  Corrupt frames
//! have no envelope to carry an error back, so they are only counted and
//! logged.

use log::{debug, warn};

use crate::config::LinkConfig;
use crate::error::{Error, Result};
use crate::rpc::server::Server;
use crate::transport::Transport;

use super::decoder::FrameDecoder;

/// Bytes pulled from the transport per read.
pub const READ_CHUNK: usize = 64;

/// Receive-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Valid frames addressed to this link.
    pub frames_received: u32,
    /// Frames dropped for a bad checksum, bad escape, short body or because
    /// they overflowed the decode buffer.
    pub frames_corrupt: u32,
    /// Valid frames for another address.
    pub frames_ignored: u32,
    /// Frame payloads the server refused (malformed packet, unknown channel).
    pub packets_rejected: u32,
}

/// Decodes up to `N` unescaped body bytes per frame.
pub struct RpcRouter<const N: usize> {
    decoder: FrameDecoder<N>,
    address: u8,
    stats: LinkStats,
}

impl<const N: usize> RpcRouter<N> {
    pub const fn new(address: u8) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            address,
            stats: LinkStats {
                frames_received: 0,
                frames_corrupt: 0,
                frames_ignored: 0,
                packets_rejected: 0,
            },
        }
    }

    /// Fails with [`Error::Config`] if `config` does not validate.
    pub fn from_config(config: &LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.hdlc_address))
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Drop any partially received frame.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Feed received bytes.  Returns the number of packets the server
    /// accepted.
    pub fn feed(&mut self, data: &[u8], server: &Server<'_>) -> usize {
        let mut dispatched = 0;
        for &byte in data {
            let Some(result) = self.decoder.feed(byte) else {
                continue;
            };
            match result {
                Err(e) => {
                    self.stats.frames_corrupt = self.stats.frames_corrupt.wrapping_add(1);
                    if e.is_corrupt() {
                        warn!("HDLC[{:02x}]: dropped frame: {}", self.address, e);
                    } else {
                        warn!("HDLC[{:02x}]: frame exceeds {}-byte decode buffer", self.address, N);
                    }
                }
                Ok(frame) if frame.address != self.address => {
                    self.stats.frames_ignored = self.stats.frames_ignored.wrapping_add(1);
                    debug!("HDLC[{:02x}]: frame for {:02x} ignored", self.address, frame.address);
                }
                Ok(frame) => {
                    self.stats.frames_received = self.stats.frames_received.wrapping_add(1);
                    match server.process_packet(frame.payload) {
                        Ok(()) => dispatched += 1,
                        Err(e) => {
                            self.stats.packets_rejected = self.stats.packets_rejected.wrapping_add(1);
                            warn!("HDLC[{:02x}]: packet rejected: {}", self.address, e);
                        }
                    }
                }
            }
        }
        dispatched
    }

    /// Drain everything the transport has buffered.
    pub fn poll<T: Transport>(&mut self, transport: &mut T, server: &Server<'_>) -> Result<usize> {
        let mut buf = [0u8; READ_CHUNK];
        let mut dispatched = 0;
        while transport.available() {
            let n = transport.read(&mut buf).map_err(|e| {
                warn!("HDLC[{:02x}]: read failed: {:?}", self.address, e);
                Error::Transport
            })?;
            if n == 0 {
                break;
            }
            dispatched += self.feed(&buf[..n], server);
        }
        Ok(dispatched)
    }
}
