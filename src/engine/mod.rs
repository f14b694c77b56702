//! Engine layer: ties the session, frame pump and retargeters together.
//!
//! - [`LiveRig`]: start / tick / reconnect / shutdown
//! - [`mirror_subject`]: build a local skeleton from the stream

mod mirror;
mod rig;

pub use mirror::mirror_subject;
pub use rig::{LiveRig, TickOutcome};
