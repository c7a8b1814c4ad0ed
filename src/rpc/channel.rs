//! Channel outputs and the shared RPC channel built on top of them.
//!
//! A [`ChannelOutput`] owns one scratch buffer and hands out its payload
//! region under an acquire/release protocol.  A [`Channel`] pairs an output
//! with a channel id and serializes every send through one lock, so the
//! dispatcher and any retained stream writers never interleave.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use log::debug;

use crate::error::{Error, OutputError, PacketError};

use super::packet::Packet;

/// Exclusive access to a fixed payload region followed by a send.
pub trait ChannelOutput {
    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Usable payload capacity of the region returned by `acquire_buffer`.
    ///
    /// This can be well below the size of the scratch buffer.  An output
    /// that frames in place must leave room for worst-case escaping, so an
    /// HDLC output of `N` bytes offers `(N - 14) / 2`: 25 bytes of a 64-byte
    /// buffer, none of a 15-byte one.
    fn buffer_size(&self) -> usize;

    /// Borrow the payload region.
    ///
    /// Fails with `BufferInUse` while a previous region is still
    /// outstanding; implementations never hand out a second region.
    fn acquire_buffer(&mut self) -> Result<&mut [u8], OutputError>;

    /// Send the first `len` bytes of the acquired region and release it.
    ///
    /// The region is released even when the send fails.
    fn send_and_release_buffer(&mut self, len: usize) -> Result<(), OutputError>;

    /// Release the acquired region without sending anything.
    fn discard_buffer(&mut self);
}

/// Payload encoder handed to [`RpcChannel::send_with`].
pub type PayloadEncoder<'f> = &'f mut dyn FnMut(&mut [u8]) -> Result<usize, Error>;

/// An id-bearing channel the server can reply on.
///
/// Object-safe so servers and stream writers can hold `&dyn RpcChannel`
/// regardless of the output or mutex behind it.
pub trait RpcChannel {
    fn id(&self) -> u32;

    /// Payload capacity of the underlying output.
    fn buffer_size(&self) -> usize;

    /// Encode `packet` with the payload produced by `payload`, then send it
    /// as one unit.  Returns the encoded envelope length.
    ///
    /// Nothing is sent if any step fails.
    fn send_with(&self, packet: &Packet<'_>, payload: PayloadEncoder<'_>) -> Result<usize, Error>;

    /// Encode and send `packet` with its own payload.
    fn send(&self, packet: &Packet<'_>) -> Result<usize, Error> {
        let bytes = packet.payload;
        self.send_with(packet, &mut |dst: &mut [u8]| {
            let dst = dst.get_mut(..bytes.len()).ok_or(PacketError::BufferTooSmall)?;
            dst.copy_from_slice(bytes);
            Ok(bytes.len())
        })
    }
}

/// A channel id bound to one output behind a blocking mutex.
///
/// With `NoopRawMutex` the channel is single-context only; with
/// `CriticalSectionRawMutex` it is `Sync` and may be shared with interrupt
/// or timer contexts.
pub struct Channel<M: RawMutex, O> {
    id: u32,
    output: Mutex<M, RefCell<O>>,
}

impl<M: RawMutex, O: ChannelOutput> Channel<M, O> {
    pub const fn new(id: u32, output: O) -> Self {
        Self {
            id,
            output: Mutex::new(RefCell::new(output)),
        }
    }

    /// Run `f` with exclusive access to the output.
    pub fn with_output<R>(&self, f: impl FnOnce(&mut O) -> R) -> R {
        self.output.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<M: RawMutex, O: ChannelOutput> RpcChannel for Channel<M, O> {
    fn id(&self) -> u32 {
        self.id
    }

    fn buffer_size(&self) -> usize {
        self.with_output(|out| out.buffer_size())
    }

    fn send_with(&self, packet: &Packet<'_>, payload: PayloadEncoder<'_>) -> Result<usize, Error> {
        self.with_output(|out| {
            let buf = out.acquire_buffer()?;
            match packet.encode_with(buf, |dst: &mut [u8]| payload(dst)) {
                Ok(len) => {
                    out.send_and_release_buffer(len)?;
                    debug!(
                        "CH[{}]: sent {:?} {:08x}/{:08x} ({} bytes, {})",
                        self.id, packet.packet_type, packet.service_id, packet.method_id, len, packet.status
                    );
                    Ok(len)
                }
                Err(e) => {
                    out.discard_buffer();
                    Err(e)
                }
            }
        })
    }
}
