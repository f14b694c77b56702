//! Thread management for frame acquisition.
//!
//! - [`Acquirer`]: background fetch thread or synchronous per-tick updates

mod acquirer;

pub use acquirer::{Acquirer, BackgroundAcquirer, PumpStats, SynchronousAcquirer};
