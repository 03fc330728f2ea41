//! Anemos - Environmental Sensor Node Firmware
//!
//! Main firmware binary for RP2040-based sensor nodes. Reads a BME280 over
//! a bit-banged two-wire bus and relays raw measurements over a
//! Manchester-coded ASK/OOK radio link.
//!
//! Named after the Greek "anemos" meaning "wind" -
//! reflecting the weather readings the node relays over the air.
//!
//! # Execution contexts
//!
//! - Thread executor: measurement cycle (`sensor_task`)
//! - Interrupt executor on `SWI_IRQ_1`, priority P1: radio tick
//!   (`radio_tick_task`), preempting the measurement cycle at every tick

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use {defmt_rtt as _, panic_probe as _};

use anemos_core::bus::SoftI2c;
use anemos_core::radio::RadioTransmitter;
use anemos_drivers::sensor::{Bme280, SensorAddress};
use anemos_hal_rp2040::{BusLine, CycleDelay, RadioLine};

use crate::config::NODE_CONFIG;

mod channels;
mod config;
mod tasks;

/// Executor for the radio tick, above the thread executor
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Anemos firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = NODE_CONFIG;
    info!(
        "Node config: {} Hz core, {} Hz bus, {} bit/s radio, {} ms interval",
        config.core_clock_hz,
        config.bus.clock_hz(),
        config.radio.bit_rate_hz,
        config.measurement_interval_ms
    );

    // Radio data line: GPIO15 to the transmitter module DATA pin
    let radio = RadioTransmitter::new(RadioLine::new(p.PIN_15), config.radio);

    // Sensor header: SDA=GPIO4, SCL=GPIO5, external pull-ups on the board
    let delay = CycleDelay::from_core_clock_hz(config.core_clock_hz);
    let bus = SoftI2c::new(
        BusLine::new(p.PIN_4),
        BusLine::new(p.PIN_5),
        delay,
        config.bus,
    );
    info!("Bus initialized at ~{} Hz", config.bus.clock_hz());

    // build.rs only admits the two valid addresses
    let address = unwrap!(SensorAddress::from_config(&config));
    let sensor = Bme280::new(bus, address);

    // High-priority executor for the radio tick
    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(unwrap!(tasks::radio_tick_task(radio)));

    spawner.spawn(unwrap!(tasks::sensor_task(
        sensor,
        config.measurement_interval_ms
    )));

    info!("All tasks spawned");
}
