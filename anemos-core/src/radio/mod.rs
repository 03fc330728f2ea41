//! Manchester-encoded radio link transmitter
//!
//! The transmitter is split along the two execution contexts that share it:
//!
//! - [`RadioTransmitter`] lives on the periodic tick context (a timer
//!   interrupt or a task on an interrupt executor). It owns the output pin
//!   and the [`ManchesterTx`] state machine and is the only writer of both.
//! - [`RadioLink`] is the single-slot handoff between that context and the
//!   foreground. The foreground copies a buffer in and waits; the tick
//!   context takes the copy, sends it and reports completion.
//!
//! Manchester coding doubles the symbol rate compared to NRZ, so the tick
//! runs at twice the bit rate: see [`RadioConfig::tick_hz`].

pub mod link;
pub mod manchester;

use anemos_hal::gpio::OutputPin;

pub use link::{LinkState, RadioError, RadioLink, Ticket};
pub use manchester::{ManchesterTx, TxEvent, TxPhase};

pub use crate::config::RadioConfig;

/// Frame capacity of the node's radio link in bytes
pub const MAX_TX_LEN: usize = 64;

/// Logic level driven on the radio data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// Tick-side half of the radio link
///
/// Created once at boot with the line low and the encoder idle. The
/// caller is responsible for starting the periodic tick at
/// [`tick_hz`](Self::tick_hz) and for enabling interrupt delivery.
pub struct RadioTransmitter<P, const N: usize> {
    pin: P,
    tx: ManchesterTx<N>,
    config: RadioConfig,
}

impl<P: OutputPin, const N: usize> RadioTransmitter<P, N> {
    /// Take ownership of the radio data line and drive it low
    pub fn new(mut pin: P, config: RadioConfig) -> Self {
        pin.set_low();
        Self {
            pin,
            tx: ManchesterTx::new(&config),
            config,
        }
    }

    /// Required tick frequency in Hz (twice the bit rate)
    pub fn tick_hz(&self) -> u32 {
        self.config.tick_hz()
    }

    /// Get the radio configuration
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Current encoder phase
    pub fn phase(&self) -> TxPhase {
        self.tx.phase()
    }

    /// Handle one periodic tick
    ///
    /// Picks up an armed frame from `link` when idle, drives the line for
    /// this tick, and hands the slot back once the frame is finished.
    pub fn tick(&mut self, link: &RadioLink<N>) -> TxEvent {
        if self.tx.is_idle() {
            if let Some(frame) = link.take_armed() {
                self.tx.arm(frame);
            }
        }

        let event = self.tx.tick();
        match event.level() {
            Some(Level::High) => self.pin.set_high(),
            Some(Level::Low) => self.pin.set_low(),
            None => {}
        }

        if event == TxEvent::Finished {
            link.complete();
        }
        event
    }
}
