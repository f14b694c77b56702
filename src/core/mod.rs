//! Core foundation layer.
//!
//! Bottom layer with no internal dependencies.
//!
//! - [`types`]: vectors, quaternions, timestamps
//! - [`axis`]: stream-to-scene coordinate conversion

pub mod axis;
pub mod types;
