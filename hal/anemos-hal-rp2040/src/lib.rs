//! RP2040-specific HAL for the sensor node firmware
//!
//! This crate provides RP2040 implementations of the shared `anemos-hal`
//! traits:
//!
//! - Open-drain bus lines on flex pins
//! - Push-pull radio data line
//! - Cycle-counted busy-wait delay

#![no_std]

pub mod delay;
pub mod gpio;

pub use delay::CycleDelay;
pub use gpio::{BusLine, RadioLine};

// Re-export shared traits from anemos-hal for convenience
pub use anemos_hal::{Calibration, OpenDrainPin, OutputPin};
