//! Streaming-protocol seam.
//!
//! [`DataStreamClient`] is the narrow surface the session needs from a
//! capture-server SDK. Everything above this trait is SDK-agnostic; the
//! bundled [`SimulatedClient`](crate::io::bag::SimulatedClient) implements it
//! for replay and tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Connection to '{host}' failed: {reason}")]
    ConnectFailed { host: String, reason: String },

    #[error("Not connected")]
    NotConnected,

    #[error("Connect cancelled")]
    Cancelled,

    #[error("No hosts configured")]
    NoHosts,
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Outcome of a single query against the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Success,
    /// The item is unknown or has no data this frame.
    NotAvailable,
    /// The active acquisition mode cannot answer this query.
    NotSupportedInMode,
}

impl QueryStatus {
    #[inline]
    pub fn is_success(self) -> bool {
        self == QueryStatus::Success
    }
}

/// A query result: value plus status.
///
/// `value` holds the type's default whenever `status` is not `Success`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    pub value: T,
    pub status: QueryStatus,
    /// Set for pose queries when the item was not seen this frame.
    pub occluded: bool,
}

impl<T> Reading<T> {
    pub fn success(value: T) -> Self {
        Self {
            value,
            status: QueryStatus::Success,
            occluded: false,
        }
    }

    pub fn occluded(value: T) -> Self {
        Self {
            value,
            status: QueryStatus::Success,
            occluded: true,
        }
    }

    /// Successful and not occluded.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.status.is_success() && !self.occluded
    }

    /// Value if valid.
    pub fn ok(self) -> Option<T> {
        if self.is_valid() { Some(self.value) } else { None }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        Reading {
            value: f(self.value),
            status: self.status,
            occluded: self.occluded,
        }
    }
}

impl<T: Default> Reading<T> {
    pub fn not_available() -> Self {
        Self::failed(QueryStatus::NotAvailable)
    }

    pub fn not_supported() -> Self {
        Self::failed(QueryStatus::NotSupportedInMode)
    }

    fn failed(status: QueryStatus) -> Self {
        Self {
            value: T::default(),
            status,
            occluded: true,
        }
    }
}

/// How frames reach the client in non-retimed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamMode {
    /// Server pushes every frame; `get_frame` takes the latest.
    ServerPush,
    /// Client requests frames and the server prefetches the next one.
    ClientPullPreFetch,
}

/// Axis direction for the server-side axis mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Capture-server client.
///
/// Implementations are driven from exactly one thread at a time; the session
/// serializes access.
pub trait DataStreamClient: Send {
    // Connection

    /// Connect to a combined host string (`host:port;host:port`).
    fn connect(&mut self, host: &str) -> Result<()>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;

    // Channel configuration

    fn set_stream_mode(&mut self, mode: StreamMode) -> QueryStatus;
    fn enable_segment_data(&mut self) -> QueryStatus;
    /// Reduced-bandwidth segment data. Servers may not support it.
    fn enable_lightweight_segment_data(&mut self) -> QueryStatus;
    fn enable_marker_data(&mut self) -> QueryStatus;
    fn is_marker_data_enabled(&self) -> bool;
    fn set_axis_mapping(&mut self, forward: Direction, left: Direction, up: Direction) -> QueryStatus;
    fn set_timing_log(&mut self, client_log: &Path, stream_log: &Path) -> QueryStatus;
    fn add_to_subject_filter(&mut self, subject: &str) -> QueryStatus;

    // Frame acquisition

    /// Fetch the next frame (push/pull acquisition).
    fn get_frame(&mut self) -> QueryStatus;
    /// Resample the stream to now minus `offset` seconds (retimed acquisition).
    fn update_frame(&mut self, offset: f64) -> QueryStatus;
    fn frame_number(&self) -> Reading<u32>;

    // Subject and segment queries

    fn subject_count(&self) -> Reading<usize>;
    fn subject_name(&self, index: usize) -> Reading<String>;
    fn subject_root_segment_name(&self, subject: &str) -> Reading<String>;
    fn segment_count(&self, subject: &str) -> Reading<usize>;
    fn segment_name(&self, subject: &str, index: usize) -> Reading<String>;
    fn segment_child_count(&self, subject: &str, segment: &str) -> Reading<usize>;
    fn segment_child_name(&self, subject: &str, segment: &str, index: usize) -> Reading<String>;
    fn segment_parent_name(&self, subject: &str, segment: &str) -> Reading<String>;
    /// Orientation as `[x, y, z, w]` in stream axes.
    fn segment_rotation(&self, subject: &str, segment: &str) -> Reading<[f64; 4]>;
    /// Translation in millimeters, stream axes.
    fn segment_translation(&self, subject: &str, segment: &str) -> Reading<[f64; 3]>;
    fn segment_static_scale(&self, subject: &str, segment: &str) -> Reading<[f64; 3]>;

    // Marker queries

    fn marker_count(&self, subject: &str) -> Reading<usize>;
    fn marker_name(&self, subject: &str, index: usize) -> Reading<String>;
    fn marker_parent_name(&self, subject: &str, marker: &str) -> Reading<String>;
    /// Global marker position in millimeters.
    fn marker_global_translation(&self, subject: &str, marker: &str) -> Reading<[f64; 3]>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_validity() {
        assert!(Reading::success(1u32).is_valid());
        assert!(!Reading::occluded([0.0; 3]).is_valid());

        let r: Reading<usize> = Reading::not_supported();
        assert_eq!(r.status, QueryStatus::NotSupportedInMode);
        assert_eq!(r.value, 0);
        assert_eq!(r.ok(), None);
    }

    #[test]
    fn test_reading_map_keeps_status() {
        let r: Reading<String> = Reading::not_available();
        let len = r.map(|s| s.len());
        assert_eq!(len.status, QueryStatus::NotAvailable);
        assert!(len.occluded);
    }
}
