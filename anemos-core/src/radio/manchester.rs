//! Manchester encoder state machine
//!
//! Runs on the periodic tick context. Each call to [`ManchesterTx::tick`]
//! produces the line level for one tick period:
//!
//! ```text
//! Idle ──arm──▶ Start ──▶ LeadIn ×N ──▶ BitPhase1 ⇄ BitPhase2 ──▶ End ──▶ Idle
//! ```
//!
//! Bits go out MSB first. A `1` is sent as (low, high) and a `0` as
//! (high, low), i.e. a rising mid-bit edge for one and a falling one for
//! zero (IEEE 802.3). Start is folded into the first lead-in tick and End
//! takes one extra tick that forces the line low.

use heapless::Vec;

use super::Level;
use crate::config::RadioConfig;

/// Encoder lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPhase {
    /// Nothing to send
    Idle,
    /// Frame loaded, counters not yet reset
    Start,
    /// Holding the steady lead-in level
    LeadIn,
    /// First half-symbol of the current bit
    BitPhase1,
    /// Second half-symbol of the current bit
    BitPhase2,
    /// Last half-symbol emitted, line goes low on the next tick
    End,
}

/// What one tick put on the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxEvent {
    /// No transmission; line left as it was
    Idle,
    /// Lead-in tick (line high)
    LeadIn,
    /// One half-symbol of a data bit
    HalfBit(Level),
    /// Transmission complete (line forced low)
    Finished,
}

impl TxEvent {
    /// Level to drive for this tick, if any
    pub const fn level(self) -> Option<Level> {
        match self {
            TxEvent::Idle => None,
            TxEvent::LeadIn => Some(Level::High),
            TxEvent::HalfBit(level) => Some(level),
            TxEvent::Finished => Some(Level::Low),
        }
    }
}

/// Manchester transmitter state
///
/// Owns a copy of the frame being sent, so the tick context never reads
/// memory the foreground can still write.
pub struct ManchesterTx<const N: usize> {
    phase: TxPhase,
    frame: Vec<u8, N>,
    byte_index: usize,
    bit_index: u8,
    lead_in_count: u16,
    lead_in_ticks: u16,
}

impl<const N: usize> ManchesterTx<N> {
    /// Create an idle encoder
    pub const fn new(config: &RadioConfig) -> Self {
        Self {
            phase: TxPhase::Idle,
            frame: Vec::new(),
            byte_index: 0,
            bit_index: 0,
            lead_in_count: 0,
            lead_in_ticks: config.lead_in_ticks,
        }
    }

    /// Current phase
    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    /// Check if no transmission is in progress
    pub fn is_idle(&self) -> bool {
        self.phase == TxPhase::Idle
    }

    /// Index of the byte being sent
    pub fn byte_index(&self) -> usize {
        self.byte_index
    }

    /// Index of the bit being sent within the current byte (0 = MSB)
    pub fn bit_index(&self) -> u8 {
        self.bit_index
    }

    /// Load a frame and arm the state machine
    ///
    /// Replaces anything in flight; callers check [`is_idle`](Self::is_idle) first.
    pub fn arm(&mut self, frame: Vec<u8, N>) {
        self.frame = frame;
        self.phase = TxPhase::Start;
    }

    /// Advance one tick and return what goes on the line
    pub fn tick(&mut self) -> TxEvent {
        loop {
            match self.phase {
                TxPhase::Idle => return TxEvent::Idle,
                TxPhase::Start => {
                    self.byte_index = 0;
                    self.bit_index = 0;
                    self.lead_in_count = 0;
                    self.phase = TxPhase::LeadIn;
                }
                TxPhase::LeadIn => {
                    if self.lead_in_count < self.lead_in_ticks {
                        self.lead_in_count += 1;
                        return TxEvent::LeadIn;
                    }
                    self.phase = if self.frame.is_empty() {
                        TxPhase::End
                    } else {
                        TxPhase::BitPhase1
                    };
                }
                TxPhase::BitPhase1 => {
                    self.phase = TxPhase::BitPhase2;
                    let level = if self.current_bit() {
                        Level::Low
                    } else {
                        Level::High
                    };
                    return TxEvent::HalfBit(level);
                }
                TxPhase::BitPhase2 => {
                    let level = if self.current_bit() {
                        Level::High
                    } else {
                        Level::Low
                    };

                    self.bit_index += 1;
                    if self.bit_index == 8 {
                        self.bit_index = 0;
                        self.byte_index += 1;
                    }
                    self.phase = if self.byte_index == self.frame.len() {
                        TxPhase::End
                    } else {
                        TxPhase::BitPhase1
                    };
                    return TxEvent::HalfBit(level);
                }
                TxPhase::End => {
                    self.frame.clear();
                    self.phase = TxPhase::Idle;
                    return TxEvent::Finished;
                }
            }
        }
    }

    fn current_bit(&self) -> bool {
        (self.frame[self.byte_index] >> (7 - self.bit_index)) & 1 == 1
    }
}
