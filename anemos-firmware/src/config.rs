//! Node configuration
//!
//! `node.toml` is validated by the build script and compiled in as a
//! constant, so there is nothing to parse at boot.

use anemos_core::config::{BusTiming, NodeConfig, RadioConfig};

include!(concat!(env!("OUT_DIR"), "/node_config.rs"));
