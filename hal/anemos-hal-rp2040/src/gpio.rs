//! Bus and radio lines on RP2040 GPIO
//!
//! The RP2040 pad has no true open-drain mode. A bus line is emulated by
//! keeping the output latch low and switching the pad between input
//! (released) and output (driven low), so the pin never sources current.

use anemos_hal::gpio::{OpenDrainPin, OutputPin};
use embassy_rp::gpio::{Flex, Level, Output, Pin, Pull};
use embassy_rp::Peri;

/// Open-drain bus line on a flex pin
pub struct BusLine<'d> {
    pin: Flex<'d>,
}

impl<'d> BusLine<'d> {
    /// Take a pin and leave it released
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        let mut pin = Flex::new(pin);
        pin.set_low();
        pin.set_pull(Pull::None);
        pin.set_as_input();
        Self { pin }
    }
}

impl OpenDrainPin for BusLine<'_> {
    fn release(&mut self) {
        self.pin.set_as_input();
        self.pin.set_pull(Pull::None);
    }

    fn release_pulled_up(&mut self) {
        self.pin.set_as_input();
        self.pin.set_pull(Pull::Up);
    }

    fn drive_low(&mut self) {
        // Latch low before enabling the driver so the pad never goes high
        self.pin.set_low();
        self.pin.set_as_output();
    }

    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}

/// Push-pull data line feeding the radio module
pub struct RadioLine<'d> {
    pin: Output<'d>,
}

impl<'d> RadioLine<'d> {
    /// Take a pin as an output driven low
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            pin: Output::new(pin, Level::Low),
        }
    }
}

impl OutputPin for RadioLine<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}
