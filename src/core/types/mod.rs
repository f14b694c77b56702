//! Core data types for pose math.
//!
//! - [`Vec3`]: 3D vector (positions, offsets, per-axis scale)
//! - [`Quaternion`]: unit quaternion for orientation
//! - [`Timestamped<T>`]: generic timestamp wrapper

mod quaternion;
mod timestamped;
mod vector;

pub use quaternion::Quaternion;
pub use timestamped::{Timestamped, now_us};
pub use vector::Vec3;
