//! Inter-task communication
//!
//! Defines the statics shared between the measurement task and the radio
//! tick task on the high-priority executor.

use anemos_core::radio::{RadioLink, MAX_TX_LEN};

/// Single-slot handoff from the measurement cycle to the radio tick
pub static RADIO: RadioLink<MAX_TX_LEN> = RadioLink::new();
