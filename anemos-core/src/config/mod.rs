//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware builds a
//! [`NodeConfig`] from `node.toml` at compile time.

pub mod types;

pub use types::*;
