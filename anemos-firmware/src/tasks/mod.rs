//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod radio;
pub mod sensor;

pub use radio::{radio_tick_task, NodeRadio};
pub use sensor::{sensor_task, NodeSensor};
