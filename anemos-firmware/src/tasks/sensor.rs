//! Measurement cycle task
//!
//! Each cycle triggers a forced BME280 conversion, waits for it, reads the
//! raw words and sends them as one radio packet. The packet is fully sent
//! before the next cycle starts, so the radio is always idle while the bus
//! runs with interrupts masked.

use defmt::*;
use embassy_time::{Duration, Ticker, Timer};
use serde::Serialize;

use anemos_core::bus::{BusError, SoftI2c};
use anemos_drivers::sensor::bme280::{
    Bme280, RawMeasurement, SensorError, MEASUREMENT_TIME_MS,
};
use anemos_hal_rp2040::{BusLine, CycleDelay};
use anemos_protocol::MAX_PAYLOAD_SIZE;

use crate::channels::RADIO;

/// Bit-banged bus on the board's sensor header
pub type NodeBus = SoftI2c<BusLine<'static>, BusLine<'static>, CycleDelay>;

/// Environmental sensor on [`NodeBus`]
pub type NodeSensor = Bme280<NodeBus>;

/// Power-on time after a soft reset before registers accept writes
const STARTUP_TIME_MS: u64 = 2;

/// Radio payload for one measurement cycle
#[derive(Debug, Clone, Copy, Serialize)]
struct Report {
    /// Wrapping cycle counter, lets the receiver spot lost packets
    sequence: u16,
    measurement: RawMeasurement,
}

/// Run a bus operation with interrupts masked
///
/// The software clock has no hardware to absorb a preempted phase, so
/// nothing may run between its edges.
fn locked<T>(sensor: &mut NodeSensor, op: impl FnOnce(&mut NodeSensor) -> T) -> T {
    critical_section::with(|_| op(sensor))
}

/// Measurement cycle task
#[embassy_executor::task]
pub async fn sensor_task(mut sensor: NodeSensor, interval_ms: u32) {
    info!(
        "Sensor task started: address {=u8:#x}, interval {} ms",
        sensor.address().value(),
        interval_ms
    );

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));
    let mut sequence: u16 = 0;
    let mut configured = false;

    loop {
        if !configured {
            match setup(&mut sensor).await {
                Ok(()) => configured = true,
                Err(e) => {
                    warn!("Sensor setup failed, retrying next cycle: {}", e);
                    ticker.next().await;
                    continue;
                }
            }
        }

        match measure(&mut sensor).await {
            Ok(measurement) => {
                if measurement.is_skipped() {
                    warn!("Sensor reported skipped channels: {}", measurement);
                } else {
                    debug!("Measurement {}: {}", sequence, measurement);
                }
                send_report(&Report {
                    sequence,
                    measurement,
                })
                .await;
            }
            Err(e) => {
                warn!("Measurement {} failed: {}", sequence, e);
                // Sensor may have browned out; redo the reset sequence
                configured = false;
            }
        }

        sequence = sequence.wrapping_add(1);
        ticker.next().await;
    }
}

/// Reset the sensor and enable the humidity channel
async fn setup(sensor: &mut NodeSensor) -> Result<(), SensorError<BusError>> {
    locked(sensor, |s| s.reset())?;
    Timer::after_millis(STARTUP_TIME_MS).await;
    locked(sensor, |s| s.verify())?;
    locked(sensor, |s| s.configure())?;
    info!("Sensor configured");
    Ok(())
}

/// One forced conversion
async fn measure(sensor: &mut NodeSensor) -> Result<RawMeasurement, SensorError<BusError>> {
    locked(sensor, |s| s.trigger_forced())?;
    Timer::after_millis(MEASUREMENT_TIME_MS as u64).await;
    locked(sensor, |s| s.read_raw())
}

/// Serialize a report and send it, waiting for the last half-bit
async fn send_report(report: &Report) {
    let mut buffer = [0u8; MAX_PAYLOAD_SIZE];
    let payload = match postcard::to_slice(report, &mut buffer) {
        Ok(payload) => payload,
        Err(_) => {
            error!("Report does not fit in one packet");
            return;
        }
    };

    match RADIO.transmit_packet(payload).await {
        Ok(()) => trace!("Report {} sent, {} bytes", report.sequence, payload.len()),
        Err(e) => warn!("Report {} not sent: {}", report.sequence, e),
    }
}
