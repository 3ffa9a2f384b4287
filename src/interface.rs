//! Register access.
//!
//! The compensation core only ever needs to read a contiguous run of registers.
//! [`RegisterRead`] captures that capability; [`I2cInterface`] provides it on
//! top of any `embedded-hal` I²C bus.

use embedded_hal::i2c;

/// Reads `buf.len()` consecutive registers starting at `reg`.
///
/// Implementations must fill the whole buffer in a single bus transaction.
/// The sensor refreshes its data registers while a measurement cycle runs,
/// and a read split across transactions can mix values from two cycles.
pub trait RegisterRead {
    type Error;

    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: RegisterRead + ?Sized> RegisterRead for &mut T {
    type Error = T::Error;

    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read_register(self, reg, buf)
    }
}

/// I²C transport for the sensor.
#[derive(Debug)]
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Wraps the bus. `address` is typically `0x76` or `0x77`.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Gives the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: i2c::I2c> RegisterRead for I2cInterface<I2C> {
    type Error = I2C::Error;

    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        // Register address write followed by a repeated-start burst read.
        self.i2c.write_read(self.address, &[reg], buf)
    }
}
