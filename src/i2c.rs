//! Blocking two-wire bus port.
//!
//! Handlers that talk to peripherals use [`I2cBus`]; the RPC core never
//! does.  [`HalI2cBus`] adapts any `embedded-hal` I2C driver and adds the
//! enable/disable gate the board code expects.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use log::{debug, warn};

use crate::error::BusError;

/// Target address.  Wide enough for 10-bit addressing; 7-bit buses reject
/// anything above `0x7F`.
pub type Address = u16;

/// Highest 7-bit address.
pub const MAX_SEVEN_BIT_ADDRESS: Address = 0x7F;

/// Blocking request/response bus access.
pub trait I2cBus {
    /// Power up or claim the bus.
    fn enable(&mut self) -> Result<(), BusError>;

    /// Release the bus.  Transactions fail with `Disabled` until re-enabled.
    fn disable(&mut self);

    /// Write `tx`, then read `rx.len()` bytes, as one transaction.
    fn write_read(&mut self, address: Address, tx: &[u8], rx: &mut [u8]) -> Result<(), BusError>;

    fn write(&mut self, address: Address, tx: &[u8]) -> Result<(), BusError> {
        self.write_read(address, tx, &mut [])
    }

    fn read(&mut self, address: Address, rx: &mut [u8]) -> Result<(), BusError> {
        self.write_read(address, &[], rx)
    }
}

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => Self::Bus,
            ErrorKind::ArbitrationLoss => Self::ArbitrationLoss,
            ErrorKind::NoAcknowledge(_) => Self::NoAcknowledge,
            ErrorKind::Overrun => Self::Overrun,
            _ => Self::Other,
        }
    }
}

/// [`I2cBus`] over an `embedded_hal::i2c::I2c` driver (7-bit addressing).
pub struct HalI2cBus<I> {
    i2c: I,
    enabled: bool,
}

impl<I: I2c> HalI2cBus<I> {
    /// Wrap a driver.  The bus starts disabled.
    pub fn new(i2c: I) -> Self {
        Self { i2c, enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn inner(&self) -> &I {
        &self.i2c
    }

    pub fn into_inner(self) -> I {
        self.i2c
    }
}

impl<I: I2c> I2cBus for HalI2cBus<I> {
    fn enable(&mut self) -> Result<(), BusError> {
        self.enabled = true;
        debug!("I2C: enabled");
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled = false;
        debug!("I2C: disabled");
    }

    fn write_read(&mut self, address: Address, tx: &[u8], rx: &mut [u8]) -> Result<(), BusError> {
        if !self.enabled {
            return Err(BusError::Disabled);
        }
        let addr = u8::try_from(address)
            .ok()
            .filter(|&a| Address::from(a) <= MAX_SEVEN_BIT_ADDRESS)
            .ok_or(BusError::InvalidAddress)?;

        let result = match (tx.is_empty(), rx.is_empty()) {
            (_, true) => self.i2c.write(addr, tx),
            (true, false) => self.i2c.read(addr, rx),
            (false, false) => self.i2c.write_read(addr, tx, rx),
        };
        result.map_err(|e| {
            let kind = e.kind();
            warn!("I2C[{:02x}]: transaction failed: {:?}", addr, kind);
            BusError::from(kind)
        })
    }
}
