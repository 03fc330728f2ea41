//! Busy-wait timing calibration
//!
//! Software-timed protocols wait by burning a fixed number of CPU cycles.
//! The number of cycles per microsecond depends on the core clock, so it
//! is supplied once at initialization instead of being baked into the
//! protocol constants.

/// Conversion from wall-clock time to busy-wait cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Core clock cycles per microsecond
    pub cycles_per_us: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        // RP2040 default system clock
        Self::from_core_clock_hz(125_000_000)
    }
}

impl Calibration {
    /// Create a calibration from a known cycles-per-microsecond figure
    pub const fn new(cycles_per_us: u32) -> Self {
        Self { cycles_per_us }
    }

    /// Create a calibration from the core clock frequency
    ///
    /// Clocks below 1 MHz round up to one cycle per microsecond.
    pub const fn from_core_clock_hz(hz: u32) -> Self {
        let cycles = hz / 1_000_000;
        Self {
            cycles_per_us: if cycles == 0 { 1 } else { cycles },
        }
    }

    /// Busy-wait cycles for a duration in microseconds
    pub const fn cycles_for_us(&self, us: u32) -> u32 {
        let cycles = us as u64 * self.cycles_per_us as u64;
        if cycles > u32::MAX as u64 {
            u32::MAX
        } else {
            cycles as u32
        }
    }

    /// Busy-wait cycles for a duration in nanoseconds, rounded up
    pub const fn cycles_for_ns(&self, ns: u32) -> u32 {
        let cycles = (ns as u64 * self.cycles_per_us as u64).div_ceil(1000);
        if cycles > u32::MAX as u64 {
            u32::MAX
        } else {
            cycles as u32
        }
    }
}
