//! Bit-banged two-wire bus master
//!
//! Produces the open-drain clock/data protocol entirely through timed pin
//! changes on two [`OpenDrainPin`]s. Every bit is produced and consumed by
//! busy-wait delays on the calling context; there are no interrupts and
//! no suspension points.
//!
//! # Line discipline
//!
//! - A line is never driven high. "High" is a release to tri-state, with
//!   the external pull-up resolving the level.
//! - Data changes only while the clock is low, except for START (falling
//!   data edge, clock high) and STOP (rising data edge, clock high).
//! - Samples are taken half way through the clock high phase.
//!
//! # Limitations
//!
//! No clock stretching, no arbitration, no timeouts. A responder that never
//! pulls the data line low just produces [`Ack::NotAcknowledged`] after the
//! fixed acknowledgement pulse. Interrupts are not masked here; a preempted
//! transaction is silently mistimed, so callers that share the core with
//! interrupt work decide whether to run bus transactions in a critical
//! section.

use anemos_hal::gpio::OpenDrainPin;
use anemos_hal::i2c::{address_read, address_write, I2cBus};
use embedded_hal::delay::DelayNs;

use crate::config::BusTiming;

/// Acknowledgement sampled after a transmitted byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    /// Responder held the data line low during the ninth clock
    Acknowledged,
    /// Data line stayed released (high)
    NotAcknowledged,
}

impl Ack {
    /// Interpret the data line level seen during the acknowledgement clock
    pub const fn from_sda_high(sda_high: bool) -> Self {
        if sda_high {
            Ack::NotAcknowledged
        } else {
            Ack::Acknowledged
        }
    }

    /// Check if the byte was acknowledged
    pub const fn is_ack(self) -> bool {
        matches!(self, Ack::Acknowledged)
    }
}

/// Byte of a transaction that was not acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NackStage {
    /// No device answered the address byte
    Address,
    /// The device refused a data byte
    Data,
}

/// Errors from transaction-level bus operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// A byte was not acknowledged; the transaction was ended with STOP
    Nack {
        /// Which byte was refused
        stage: NackStage,
    },
}

/// Software two-wire bus master
///
/// Owns both bus lines and the busy-wait delay for the lifetime of the
/// node. Construction releases both lines, leaving the bus idle.
pub struct SoftI2c<SDA, SCL, D> {
    sda: SDA,
    scl: SCL,
    delay: D,
    timing: BusTiming,
}

impl<SDA, SCL, D> SoftI2c<SDA, SCL, D>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    D: DelayNs,
{
    /// Create a new bus master and release both lines
    ///
    /// # Arguments
    /// - `sda`: Data line
    /// - `scl`: Clock line
    /// - `delay`: Busy-wait delay, calibrated for the core clock
    /// - `timing`: Clock phase durations
    pub fn new(sda: SDA, scl: SCL, delay: D, timing: BusTiming) -> Self {
        let mut bus = Self {
            sda,
            scl,
            delay,
            timing,
        };
        bus.initialize();
        bus
    }

    /// Release both lines to tri-state, establishing the idle bus level
    pub fn initialize(&mut self) {
        self.sda.release();
        self.scl.release();
    }

    /// Get the clock timing
    pub fn timing(&self) -> BusTiming {
        self.timing
    }

    /// Give back the lines and delay
    pub fn free(self) -> (SDA, SCL, D) {
        (self.sda, self.scl, self.delay)
    }

    /// Send a START condition
    ///
    /// Works from bus idle and as a repeated start straight after a data
    /// phase (clock low), without an intervening STOP.
    pub fn start(&mut self) {
        // Data up while the clock is still low (or idle), then clock up
        self.sda.release_pulled_up();
        self.sda.release();
        self.delay.delay_us(self.timing.scl_low_us);
        self.scl.release();
        self.delay.delay_ns(self.timing.half_high_ns());

        // Falling edge on SDA with SCL high
        self.sda.drive_low();
        self.delay.delay_ns(self.timing.half_high_ns());
    }

    /// Send a STOP condition
    ///
    /// Leaves both lines released.
    pub fn stop(&mut self) {
        self.sda.drive_low();
        self.delay.delay_us(self.timing.scl_low_us);
        self.scl.release();
        self.delay.delay_ns(self.timing.half_high_ns());

        // Rising edge on SDA with SCL high
        self.sda.release();
        self.delay.delay_ns(self.timing.half_high_ns());
    }

    /// Write one byte, MSB first, and sample the acknowledgement
    ///
    /// Leaves the clock low and the data line released.
    pub fn write_byte(&mut self, byte: u8) -> Ack {
        self.scl.drive_low();

        for i in (0..8).rev() {
            if (byte >> i) & 1 == 1 {
                self.sda.release();
            } else {
                self.sda.drive_low();
            }
            self.clock_pulse();
        }

        // Switch SDA to input, listen for acknowledgement
        self.sda.release();
        Ack::from_sda_high(self.sample_pulse())
    }

    /// Read one byte and answer NOT-ACKNOWLEDGED
    ///
    /// Only suitable as the last byte of a read. The data line is parked
    /// low afterwards, ready for STOP.
    pub fn read_byte(&mut self) -> u8 {
        let byte = self.read_bits();
        self.send_ack(Ack::NotAcknowledged);
        self.sda.drive_low();
        byte
    }

    /// Read `buf.len()` bytes in order
    ///
    /// Every byte but the last is acknowledged so the responder keeps
    /// sending; the last gets NOT-ACKNOWLEDGED. The data line is parked
    /// low afterwards, ready for STOP. An empty buffer leaves the bus as is.
    pub fn read_buffer(&mut self, buf: &mut [u8]) {
        if buf.is_empty() {
            return;
        }

        let last = buf.len() - 1;
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.read_bits();
            let ack = if i == last {
                Ack::NotAcknowledged
            } else {
                Ack::Acknowledged
            };
            self.send_ack(ack);
        }

        self.sda.drive_low();
    }

    /// Shift in eight bits, MSB first, sampling mid clock-high
    fn read_bits(&mut self) -> u8 {
        self.sda.release();
        self.scl.drive_low();

        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | self.sample_pulse() as u8;
        }
        byte
    }

    /// Drive the acknowledgement bit for a received byte
    fn send_ack(&mut self, ack: Ack) {
        if ack.is_ack() {
            self.sda.drive_low();
        }
        self.clock_pulse();
        self.sda.release();
    }

    /// One full clock period with the data line left alone
    fn clock_pulse(&mut self) {
        self.delay.delay_us(self.timing.scl_low_us);
        self.scl.release();
        self.delay.delay_us(self.timing.scl_high_us);
        self.scl.drive_low();
    }

    /// One full clock period, sampling the data line half way through high
    ///
    /// Returns true if the data line read high.
    fn sample_pulse(&mut self) -> bool {
        let half = self.timing.half_high_ns();

        self.delay.delay_us(self.timing.scl_low_us);
        self.scl.release();
        self.delay.delay_ns(half);
        let high = self.sda.is_high();
        self.delay.delay_ns(half);
        self.scl.drive_low();
        high
    }

    /// Send an address byte followed by data bytes, stopping at the first NACK
    fn write_addressed(&mut self, address_byte: u8, data: &[u8]) -> Result<(), BusError> {
        if !self.write_byte(address_byte).is_ack() {
            return Err(BusError::Nack {
                stage: NackStage::Address,
            });
        }

        for &byte in data {
            if !self.write_byte(byte).is_ack() {
                return Err(BusError::Nack {
                    stage: NackStage::Data,
                });
            }
        }

        Ok(())
    }
}

impl<SDA, SCL, D> I2cBus for SoftI2c<SDA, SCL, D>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    D: DelayNs,
{
    type Error = BusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.start();
        let result = self.write_addressed(address_write(address), data);
        self.stop();
        result
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.start();
        let result = self
            .write_addressed(address_read(address), &[])
            .map(|()| self.read_buffer(buf));
        self.stop();
        result
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.start();
        let result = self
            .write_addressed(address_write(address), write_data)
            .and_then(|()| {
                // Repeated start, no STOP in between
                self.start();
                self.write_addressed(address_read(address), &[])
            })
            .map(|()| self.read_buffer(read_buf));
        self.stop();
        result
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use proptest::prelude::*;

    use super::*;
    use crate::bus::sim::{decode, BusEvent, Responder, SimDelay, SimPin, Token, Wire};

    const SENSOR: u8 = 0x76;

    fn bus(wire: &RefCell<Wire>) -> SoftI2c<SimPin<'_>, SimPin<'_>, SimDelay<'_>> {
        SoftI2c::new(
            SimPin::sda(wire),
            SimPin::scl(wire),
            SimDelay::new(wire),
            BusTiming::STANDARD,
        )
    }

    #[test]
    fn test_initialize_releases_lines() {
        let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
        wire.borrow_mut().force_low();

        let _bus = bus(&wire);
        assert!(wire.borrow().lines_released());
    }

    #[test]
    fn test_start_stop_edges() {
        let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
        let mut bus = bus(&wire);

        bus.start();
        bus.stop();

        let w = wire.borrow();
        assert_eq!(w.log.as_slice(), &[BusEvent::Start, BusEvent::Stop]);
        assert!(w.lines_released());
    }

    #[test]
    fn test_write_address_acknowledged() {
        let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
        let mut bus = bus(&wire);

        bus.start();
        let ack = bus.write_byte(address_write(SENSOR));
        bus.stop();

        assert_eq!(ack, Ack::Acknowledged);
        let tokens = decode(&wire.borrow().log);
        assert_eq!(
            tokens.as_slice(),
            &[
                Token::Start,
                Token::Byte {
                    value: 0b1110_1100,
                    acked: true
                },
                Token::Stop,
            ]
        );
    }

    #[test]
    fn test_read_address_bit_set() {
        let responder = Responder::new(SENSOR).with_read_data(&[0x42]);
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        bus.start();
        assert!(bus.write_byte(address_read(SENSOR)).is_ack());
        assert_eq!(bus.read_byte(), 0x42);
        bus.stop();

        let tokens = decode(&wire.borrow().log);
        assert_eq!(
            tokens[1],
            Token::Byte {
                value: 0b1110_1101,
                acked: true
            }
        );
    }

    #[test]
    fn test_write_byte_leaves_clock_low_data_released() {
        let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
        let mut bus = bus(&wire);

        bus.start();
        bus.write_byte(0x00);

        let w = wire.borrow();
        assert!(!w.scl());
        assert!(w.sda_released());
    }

    #[test]
    fn test_absent_device_not_acknowledged() {
        let wire = RefCell::new(Wire::new(Responder::new(0x77)));
        let mut bus = bus(&wire);

        bus.start();
        let ack = bus.write_byte(address_write(SENSOR));
        bus.stop();

        assert_eq!(ack, Ack::NotAcknowledged);
        assert!(wire.borrow().lines_released());
    }

    #[test]
    fn test_read_byte_sends_nack() {
        let responder = Responder::new(SENSOR).with_read_data(&[0xA5, 0x5A]);
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        bus.start();
        bus.write_byte(address_read(SENSOR));
        let byte = bus.read_byte();
        bus.stop();

        assert_eq!(byte, 0xA5);
        let w = wire.borrow();
        assert_eq!(w.responder.master_acks.as_slice(), &[false]);
    }

    #[test]
    fn test_read_buffer_acks_all_but_last() {
        let data = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        let responder = Responder::new(SENSOR).with_read_data(&data);
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        let mut buf = [0u8; 8];
        bus.start();
        bus.write_byte(address_read(SENSOR));
        bus.read_buffer(&mut buf);
        bus.stop();

        assert_eq!(buf, data);
        let w = wire.borrow();
        assert_eq!(
            w.responder.master_acks.as_slice(),
            &[true, true, true, true, true, true, true, false]
        );
        assert!(w.lines_released());
    }

    #[test]
    fn test_read_buffer_single_byte() {
        let responder = Responder::new(SENSOR).with_read_data(&[0x9C]);
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        let mut buf = [0u8; 1];
        bus.start();
        bus.write_byte(address_read(SENSOR));
        bus.read_buffer(&mut buf);
        bus.stop();

        assert_eq!(buf, [0x9C]);
        assert_eq!(wire.borrow().responder.master_acks.as_slice(), &[false]);
    }

    #[test]
    fn test_read_buffer_empty_is_noop() {
        let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
        let mut bus = bus(&wire);

        bus.read_buffer(&mut []);
        assert!(wire.borrow().log.is_empty());
        assert!(wire.borrow().lines_released());
    }

    #[test]
    fn test_sample_centered_in_high_phase() {
        let responder = Responder::new(SENSOR).with_read_data(&[0xFF]);
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        bus.start();
        bus.write_byte(address_read(SENSOR));
        bus.read_byte();

        // ACK sample plus eight data samples, all at the middle of the 5 µs high phase
        let w = wire.borrow();
        assert_eq!(w.sample_offsets_ns.len(), 9);
        assert!(w.sample_offsets_ns.iter().all(|&ns| ns == 2_500));
    }

    #[test]
    fn test_clock_high_phase_duration() {
        let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
        let mut bus = bus(&wire);

        bus.start();
        bus.write_byte(0xAA);

        // Eight data pulses plus the ACK pulse, each high for 5 µs
        let w = wire.borrow();
        assert_eq!(w.high_phases_ns.len(), 9);
        assert!(w.high_phases_ns.iter().all(|&ns| ns == 5_000));
    }

    #[test]
    fn test_i2c_bus_write() {
        let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
        let mut bus = bus(&wire);

        bus.write(SENSOR, &[0xE0, 0xB6]).unwrap();

        let w = wire.borrow();
        assert_eq!(w.responder.received.as_slice(), &[0xE0, 0xB6]);
        assert!(w.lines_released());
    }

    #[test]
    fn test_i2c_bus_write_address_nack() {
        let wire = RefCell::new(Wire::new(Responder::new(0x77)));
        let mut bus = bus(&wire);

        let result = bus.write(SENSOR, &[0xE0, 0xB6]);
        assert_eq!(
            result,
            Err(BusError::Nack {
                stage: NackStage::Address
            })
        );

        // Transaction still closed with STOP
        let w = wire.borrow();
        assert_eq!(w.log.last(), Some(&BusEvent::Stop));
        assert!(w.lines_released());
    }

    #[test]
    fn test_i2c_bus_write_data_nack() {
        let responder = Responder::new(SENSOR).refuse_data();
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        let result = bus.write(SENSOR, &[0xF4, 0x25]);
        assert_eq!(
            result,
            Err(BusError::Nack {
                stage: NackStage::Data
            })
        );
        // Stopped after the first refused byte
        assert_eq!(wire.borrow().responder.received.as_slice(), &[0xF4]);
    }

    #[test]
    fn test_i2c_bus_write_read_repeated_start() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        let responder = Responder::new(SENSOR).with_read_data(&data);
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        let mut buf = [0u8; 8];
        bus.write_read(SENSOR, &[0xF7], &mut buf).unwrap();
        assert_eq!(buf, data);

        let w = wire.borrow();
        let tokens = decode(&w.log);
        // Exactly one STOP, at the very end
        let starts = tokens.iter().filter(|t| **t == Token::Start).count();
        let stops = tokens.iter().filter(|t| **t == Token::Stop).count();
        assert_eq!(starts, 2);
        assert_eq!(stops, 1);
        assert_eq!(tokens.last(), Some(&Token::Stop));
        assert_eq!(
            tokens[1],
            Token::Byte {
                value: 0xEC,
                acked: true
            }
        );
        assert_eq!(
            tokens[2],
            Token::Byte {
                value: 0xF7,
                acked: true
            }
        );
        assert_eq!(tokens[3], Token::Start);
        assert_eq!(
            tokens[4],
            Token::Byte {
                value: 0xED,
                acked: true
            }
        );
        assert_eq!(w.responder.received.as_slice(), &[0xF7]);
    }

    #[test]
    fn test_i2c_bus_read() {
        let responder = Responder::new(SENSOR).with_read_data(&[0xDE, 0xAD]);
        let wire = RefCell::new(Wire::new(responder));
        let mut bus = bus(&wire);

        let mut buf = [0u8; 2];
        bus.read(SENSOR, &mut buf).unwrap();
        assert_eq!(buf, [0xDE, 0xAD]);
        assert_eq!(
            wire.borrow().responder.master_acks.as_slice(),
            &[true, false]
        );
    }

    proptest! {
        #[test]
        fn prop_write_byte_msb_first(value in any::<u8>()) {
            let wire = RefCell::new(Wire::new(Responder::new(SENSOR)));
            let mut bus = bus(&wire);

            bus.start();
            bus.write_byte(value);
            bus.stop();

            let w = wire.borrow();
            let bits: heapless::Vec<bool, 16> = w
                .log
                .iter()
                .filter_map(|e| match e {
                    BusEvent::Bit(level) => Some(*level),
                    _ => None,
                })
                .take(8)
                .collect();
            for (i, bit) in bits.iter().enumerate() {
                prop_assert_eq!(*bit, (value >> (7 - i)) & 1 == 1);
            }
            prop_assert_eq!(bits.len(), 8);
        }

        #[test]
        fn prop_read_buffer_roundtrips_responder_data(
            data in proptest::collection::vec(any::<u8>(), 1..16)
        ) {
            let responder = Responder::new(SENSOR).with_read_data(&data);
            let wire = RefCell::new(Wire::new(responder));
            let mut bus = bus(&wire);

            let mut buf = [0u8; 16];
            let buf = &mut buf[..data.len()];
            bus.read(SENSOR, buf).unwrap();

            prop_assert_eq!(&buf[..], &data[..]);
            let w = wire.borrow();
            let acks = &w.responder.master_acks;
            prop_assert_eq!(acks.len(), data.len());
            prop_assert!(acks[..data.len() - 1].iter().all(|a| *a));
            prop_assert!(!acks[data.len() - 1]);
        }
    }
}
