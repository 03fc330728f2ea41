//! Anemos Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs. The line-protocol engines in `anemos-core` are
//! written against these traits only, so they run unchanged on the target
//! and against simulated pins on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (anemos-firmware)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  anemos-core (bus + radio engines)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  anemos-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  anemos-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OpenDrainPin`] - Bus line that is released or pulled low, never driven high
//! - [`gpio::OutputPin`] - Push-pull digital output
//! - [`i2c::I2cBus`] - Two-wire bus transactions
//! - [`timing::Calibration`] - Core clock to busy-wait cycle conversion

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod timing;

// Re-export key traits at crate root for convenience
pub use gpio::{OpenDrainPin, OutputPin};
pub use i2c::I2cBus;
pub use timing::Calibration;
