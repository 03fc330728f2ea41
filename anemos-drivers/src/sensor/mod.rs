//! Sensor drivers

pub mod bme280;

pub use bme280::{Bme280, RawMeasurement, SensorAddress, SensorError};
