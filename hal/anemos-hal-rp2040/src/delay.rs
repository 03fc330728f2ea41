//! Cycle-counted busy-wait delay
//!
//! Bus bit timing is a few microseconds per phase, well below the
//! resolution of the embassy time driver, so the bus master spins instead.

use anemos_hal::Calibration;
use embedded_hal::delay::DelayNs;

/// Busy-wait delay calibrated to the core clock
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleDelay {
    calibration: Calibration,
}

impl CycleDelay {
    /// Create a delay for the given calibration
    pub const fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    /// Create a delay from the core clock frequency
    pub const fn from_core_clock_hz(hz: u32) -> Self {
        Self::new(Calibration::from_core_clock_hz(hz))
    }

    /// Get the calibration in use
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        cortex_m::asm::delay(self.calibration.cycles_for_ns(ns));
    }

    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(self.calibration.cycles_for_us(us));
    }
}
