//! Configuration type definitions
//!
//! Every type here is `const`-constructible so the firmware can bake the
//! validated configuration into flash as a plain constant.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default 7-bit address of the environmental sensor (SDO tied low)
pub const DEFAULT_SENSOR_ADDRESS: u8 = 0x76;

/// Two-wire bus clock timing
///
/// Durations are wall-clock microseconds; the busy-wait delay converts
/// them using the core clock calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusTiming {
    /// Clock high-phase hold time in µs
    pub scl_high_us: u32,
    /// Clock low-phase (data setup) time in µs
    pub scl_low_us: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl BusTiming {
    /// Roughly 100 kHz standard mode
    pub const STANDARD: Self = Self {
        scl_high_us: 5,
        scl_low_us: 5,
    };

    /// Half of the high phase in ns, used to center samples away from edges
    ///
    /// Kept in nanoseconds so odd microsecond phases still split evenly.
    pub const fn half_high_ns(&self) -> u32 {
        self.scl_high_us.saturating_mul(500)
    }

    /// Resulting clock frequency in Hz (approximate, ignores pin latency)
    pub const fn clock_hz(&self) -> u32 {
        let period = self.scl_high_us + self.scl_low_us;
        if period == 0 {
            0
        } else {
            1_000_000 / period
        }
    }
}

/// Radio link timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadioConfig {
    /// Data bit rate in bits per second
    pub bit_rate_hz: u32,
    /// Number of ticks the steady lead-in level is held before data
    pub lead_in_ticks: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            bit_rate_hz: 2_000,
            lead_in_ticks: 20,
        }
    }
}

impl RadioConfig {
    /// Tick (half-symbol) rate in Hz
    ///
    /// Manchester coding needs two ticks per data bit.
    pub const fn tick_hz(&self) -> u32 {
        self.bit_rate_hz * 2
    }

    /// Tick period in microseconds
    pub const fn tick_period_us(&self) -> u32 {
        let hz = self.tick_hz();
        if hz == 0 {
            0
        } else {
            1_000_000 / hz
        }
    }

    /// Total ticks needed to send `len` bytes (lead-in + half-symbols)
    pub const fn ticks_for(&self, len: usize) -> u32 {
        self.lead_in_ticks as u32 + 2 * 8 * len as u32
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeConfig {
    /// Core clock in Hz, used to calibrate busy-wait delays
    pub core_clock_hz: u32,
    /// Two-wire bus timing
    pub bus: BusTiming,
    /// Radio link timing
    pub radio: RadioConfig,
    /// 7-bit address of the environmental sensor
    pub sensor_address: u8,
    /// Interval between measurement cycles in milliseconds
    pub measurement_interval_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            core_clock_hz: 125_000_000,
            bus: BusTiming::STANDARD,
            radio: RadioConfig {
                bit_rate_hz: 2_000,
                lead_in_ticks: 20,
            },
            sensor_address: DEFAULT_SENSOR_ADDRESS,
            measurement_interval_ms: 60_000,
        }
    }
}
