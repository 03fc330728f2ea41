//! Two-wire bus master
//!
//! A software replacement for a bus peripheral: START/STOP conditions,
//! byte writes with acknowledgement sampling, and byte/buffer reads with
//! acknowledgement generation, all timed by busy-wait delays.

pub mod master;

#[cfg(test)]
pub(crate) mod sim;

pub use anemos_hal::i2c::{address_read, address_write, Direction};
pub use master::{Ack, BusError, NackStage, SoftI2c};

pub use crate::config::BusTiming;
