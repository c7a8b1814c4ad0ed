//! Byte transports underneath the framer.
//!
//! UART, USB CDC or a host socket implement [`Transport`] in board code.
//! The channel output writes whole frames to it and the router drains it,
//! so neither cares which link is attached.

use heapless::Vec;

/// Non-blocking byte pipe.
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Copy pending input into `buf`.  `Ok(0)` means nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Queue `data` for output and return how much was accepted.  The
    /// channel output treats anything short of `data.len()` as a failure.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Whether `read` would return data.
    fn available(&self) -> bool;

    /// Bytes `write` can accept right now without truncating.
    fn write_space(&self) -> usize;
}

/// Sink that accepts and drops everything; reads are always empty.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }

    fn write_space(&self) -> usize {
        usize::MAX
    }
}

/// Error from [`MemoryWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryFull;

/// Fixed-capacity in-memory sink.
///
/// Writes are all-or-nothing: data that does not fit entirely is rejected
/// and nothing is appended.
pub struct MemoryWriter<const N: usize> {
    data: Vec<u8, N>,
    writes: usize,
}

impl<const N: usize> MemoryWriter<N> {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            writes: 0,
        }
    }

    /// Everything written so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of successful `write` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.writes = 0;
    }
}

impl<const N: usize> Default for MemoryWriter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Transport for MemoryWriter<N> {
    type Error = MemoryFull;

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, MemoryFull> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, MemoryFull> {
        self.data.extend_from_slice(data).map_err(|()| MemoryFull)?;
        self.writes += 1;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), MemoryFull> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }

    fn write_space(&self) -> usize {
        N - self.data.len()
    }
}
