//! BME280 combined humidity, pressure and temperature sensor
//!
//! Runs the sensor in forced mode: each measurement cycle writes the
//! control register to start one conversion, waits for it to finish and
//! burst-reads the eight data registers.
//!
//! # Bus Sequence
//!
//! ```text
//! reset:     S | addr W | E0 | B6 | P
//! configure: S | addr W | F2 | 01 | P
//! trigger:   S | addr W | F4 | 25 | P
//! read:      S | addr W | F7 | Sr | addr R | 8 bytes | P
//! ```
//!
//! Only raw ADC words are returned. Compensation needs the factory trim
//! registers and is left to the receiving station.

use anemos_core::config::NodeConfig;
use anemos_hal::i2c::I2cBus;
use embedded_hal::delay::DelayNs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// BME280 register addresses
pub mod reg {
    /// Chip identification
    pub const ID: u8 = 0xD0;
    /// Soft reset
    pub const RESET: u8 = 0xE0;
    /// Humidity oversampling
    pub const CTRL_HUM: u8 = 0xF2;
    /// Pressure/temperature oversampling and mode
    pub const CTRL_MEAS: u8 = 0xF4;
    /// First data register (press_msb); data runs to 0xFE
    pub const DATA: u8 = 0xF7;
}

/// Value written to `RESET` to trigger a power-on reset
const RESET_COMMAND: u8 = 0xB6;

/// Humidity oversampling x1
const CTRL_HUM_OSRS_X1: u8 = 0x01;

/// Pressure x1, temperature x1, forced mode
const CTRL_MEAS_FORCED: u8 = 0b0010_0101;

/// Expected contents of the `ID` register
pub const CHIP_ID: u8 = 0x60;

/// Conversion time with x1 oversampling on all channels, rounded up
pub const MEASUREMENT_TIME_MS: u32 = 10;

/// Length of the pressure/temperature/humidity burst read
pub const DATA_LEN: usize = 8;

/// Bus address selected by the SDO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorAddress {
    /// SDO tied to ground
    #[default]
    Primary,
    /// SDO tied to supply
    Secondary,
}

impl SensorAddress {
    /// 7-bit bus address
    pub const fn value(self) -> u8 {
        match self {
            SensorAddress::Primary => 0x76,
            SensorAddress::Secondary => 0x77,
        }
    }

    /// Parse a 7-bit address, rejecting anything the chip cannot answer on
    pub const fn from_u8(address: u8) -> Option<Self> {
        match address {
            0x76 => Some(SensorAddress::Primary),
            0x77 => Some(SensorAddress::Secondary),
            _ => None,
        }
    }

    /// Address configured for the node
    pub const fn from_config(config: &NodeConfig) -> Option<Self> {
        Self::from_u8(config.sensor_address)
    }
}

/// Errors from BME280 operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError<E> {
    /// Bus transaction failed
    Bus(E),
    /// The `ID` register did not read back as a BME280
    UnexpectedChipId(u8),
}

/// Uncompensated ADC words from one forced measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawMeasurement {
    /// 20-bit pressure word
    pub pressure: u32,
    /// 20-bit temperature word
    pub temperature: u32,
    /// 16-bit humidity word
    pub humidity: u16,
}

impl RawMeasurement {
    /// Value the chip reports for a 20-bit channel that was skipped
    pub const SKIPPED_20BIT: u32 = 0x8_0000;
    /// Value the chip reports for the humidity channel when skipped
    pub const SKIPPED_HUMIDITY: u16 = 0x8000;

    /// Unpack the burst read starting at `press_msb`
    ///
    /// The 20-bit words are stored as msb, lsb, xlsb with the xlsb value in
    /// the upper nibble.
    pub const fn from_bytes(bytes: &[u8; DATA_LEN]) -> Self {
        Self {
            pressure: unpack_20bit(bytes[0], bytes[1], bytes[2]),
            temperature: unpack_20bit(bytes[3], bytes[4], bytes[5]),
            humidity: u16::from_be_bytes([bytes[6], bytes[7]]),
        }
    }

    /// Check if any channel reported its skipped marker
    pub const fn is_skipped(&self) -> bool {
        self.pressure == Self::SKIPPED_20BIT
            || self.temperature == Self::SKIPPED_20BIT
            || self.humidity == Self::SKIPPED_HUMIDITY
    }
}

const fn unpack_20bit(msb: u8, lsb: u8, xlsb: u8) -> u32 {
    ((msb as u32) << 12) | ((lsb as u32) << 4) | ((xlsb as u32) >> 4)
}

/// BME280 driver over a two-wire bus
pub struct Bme280<B> {
    bus: B,
    address: SensorAddress,
}

impl<B: I2cBus> Bme280<B> {
    /// Create a driver for the sensor at `address`
    ///
    /// No bus traffic happens until [`reset`](Self::reset) or
    /// [`configure`](Self::configure) is called.
    pub fn new(bus: B, address: SensorAddress) -> Self {
        Self { bus, address }
    }

    /// Get the configured address
    pub fn address(&self) -> SensorAddress {
        self.address
    }

    /// Release the bus
    pub fn free(self) -> B {
        self.bus
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError<B::Error>> {
        self.bus
            .write(self.address.value(), &[register, value])
            .map_err(SensorError::Bus)
    }

    /// Read the chip identification register
    pub fn chip_id(&mut self) -> Result<u8, SensorError<B::Error>> {
        let mut id = [0u8; 1];
        self.bus
            .write_read(self.address.value(), &[reg::ID], &mut id)
            .map_err(SensorError::Bus)?;
        Ok(id[0])
    }

    /// Confirm a BME280 answers at the configured address
    pub fn verify(&mut self) -> Result<(), SensorError<B::Error>> {
        match self.chip_id()? {
            CHIP_ID => Ok(()),
            other => Err(SensorError::UnexpectedChipId(other)),
        }
    }

    /// Soft reset, returning all registers to power-on defaults
    pub fn reset(&mut self) -> Result<(), SensorError<B::Error>> {
        self.write_register(reg::RESET, RESET_COMMAND)
    }

    /// Enable humidity sensing with x1 oversampling
    ///
    /// `CTRL_HUM` only takes effect on the next `CTRL_MEAS` write, which
    /// [`trigger_forced`](Self::trigger_forced) provides.
    pub fn configure(&mut self) -> Result<(), SensorError<B::Error>> {
        self.write_register(reg::CTRL_HUM, CTRL_HUM_OSRS_X1)
    }

    /// Start one forced-mode conversion
    ///
    /// Results are valid after [`MEASUREMENT_TIME_MS`].
    pub fn trigger_forced(&mut self) -> Result<(), SensorError<B::Error>> {
        self.write_register(reg::CTRL_MEAS, CTRL_MEAS_FORCED)
    }

    /// Burst-read the data registers
    pub fn read_raw(&mut self) -> Result<RawMeasurement, SensorError<B::Error>> {
        let mut bytes = [0u8; DATA_LEN];
        self.bus
            .write_read(self.address.value(), &[reg::DATA], &mut bytes)
            .map_err(SensorError::Bus)?;
        Ok(RawMeasurement::from_bytes(&bytes))
    }

    /// Trigger, wait and read in one blocking call
    pub fn measure<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<RawMeasurement, SensorError<B::Error>> {
        self.trigger_forced()?;
        delay.delay_ms(MEASUREMENT_TIME_MS);
        self.read_raw()
    }
}
