//! Anemos Radio Packet Protocol
//!
//! This crate defines the packet layer on top of the raw Manchester radio
//! link. The link itself only moves bytes; a packet adds what a receiver
//! needs to find and check them.
//!
//! # Packet Overview
//!
//! ```text
//! ┌──────┬────────┬─────────────┬───────┐
//! │ SYNC │ LENGTH │ PAYLOAD     │ CRC-8 │
//! │ 1B   │ 1B     │ 0–32B       │ 1B    │
//! └──────┴────────┴─────────────┴───────┘
//! ```
//!
//! There is no addressing, retransmission or acknowledgement. A node sends
//! one packet per measurement cycle and the base station keeps whatever
//! passes the check.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod crc;
pub mod packet;

pub use crc::crc8;
pub use packet::{
    Packet, PacketError, PacketParser, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, SYNC_WORD,
};
