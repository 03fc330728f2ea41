//! Radio tick task
//!
//! Runs on the interrupt executor so each tick preempts the measurement
//! cycle. The ticker fires at twice the bit rate; every tick drives exactly
//! one half-symbol.

use defmt::*;
use embassy_time::{Duration, Ticker};

use anemos_core::radio::{RadioTransmitter, TxEvent, MAX_TX_LEN};
use anemos_hal_rp2040::RadioLine;

use crate::channels::RADIO;

/// Radio transmitter on the board's data line
pub type NodeRadio = RadioTransmitter<RadioLine<'static>, MAX_TX_LEN>;

/// Radio tick task - sole driver of the Manchester encoder
#[embassy_executor::task]
pub async fn radio_tick_task(mut radio: NodeRadio) {
    let tick_hz = radio.tick_hz();
    info!(
        "Radio tick task started: {} bit/s, {} Hz tick",
        radio.config().bit_rate_hz,
        tick_hz
    );

    let mut ticker = Ticker::every(Duration::from_hz(tick_hz as u64));

    loop {
        ticker.next().await;

        if radio.tick(&RADIO) == TxEvent::Finished {
            trace!("Radio frame finished");
        }
    }
}
