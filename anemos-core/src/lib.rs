//! Line-protocol engines for the Anemos sensor node
//!
//! This crate contains the two software-defined protocols that stand in
//! for dedicated peripheral hardware on the node:
//!
//! - [`bus`] - Bit-banged two-wire bus master (synchronous, busy-wait timed)
//! - [`radio`] - Manchester-encoded radio transmitter (tick-driven state
//!   machine plus a single-slot foreground handoff)
//! - [`config`] - Node configuration type definitions
//!
//! Neither engine touches hardware directly; pins and delays come in
//! through the `anemos-hal` traits and `embedded-hal` delays, so both run
//! against simulated lines in host tests.
//!
//! # Timing caveat
//!
//! Both engines are software timed. If the host clock differs from the
//! calibration, or an interrupt preempts a bus transaction, the line
//! timing is silently corrupted. Nothing here detects that.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod config;
pub mod radio;
