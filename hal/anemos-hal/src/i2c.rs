//! Two-wire bus abstractions
//!
//! Provides the transaction-level trait that sensor drivers consume. The
//! bit-banged master in `anemos-core` implements it; so could a hardware
//! peripheral.

/// Two-wire bus master
///
/// Provides basic read/write operations for communicating with
/// peripheral devices.
pub trait I2cBus {
    /// Error type for bus operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit device address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit device address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit device address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Transfer direction encoded in bit 0 of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Controller writes to the device (bit 0 = 0)
    Write,
    /// Controller reads from the device (bit 0 = 1)
    Read,
}

/// Build the address byte for a 7-bit address and direction
///
/// The address is shifted left one bit and the direction goes in bit 0.
pub const fn address_byte(address: u8, direction: Direction) -> u8 {
    match direction {
        Direction::Write => (address << 1) & !1,
        Direction::Read => (address << 1) | 1,
    }
}

/// Address byte for a write-addressed transaction
pub const fn address_write(address: u8) -> u8 {
    address_byte(address, Direction::Write)
}

/// Address byte for a read-addressed transaction
pub const fn address_read(address: u8) -> u8 {
    address_byte(address, Direction::Read)
}
