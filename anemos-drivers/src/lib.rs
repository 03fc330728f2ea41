//! Peripheral drivers
//!
//! Drivers here talk to devices through the transaction-level traits in
//! `anemos-hal`, so they run the same over the bit-banged bus master in
//! `anemos-core` or over a hardware peripheral.
//!
//! - Environmental sensors (BME280)

#![no_std]
#![deny(unsafe_code)]

pub mod sensor;
