//! Capture file data types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::types::Timestamped;

/// Magic bytes at start of capture file.
pub const BAG_MAGIC: [u8; 4] = *b"MOCP";

/// Current capture format version.
pub const BAG_VERSION: u16 = 1;

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 64;

/// Capture header, stored at the start of every file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagHeader {
    pub magic: [u8; 4],
    pub version: u16,
    /// Timestamp of first frame (microseconds since epoch)
    pub start_time_us: u64,
    /// Timestamp of last frame (microseconds since epoch)
    pub end_time_us: u64,
    pub frame_count: u64,
    pub reserved: [u8; 8],
}

impl BagHeader {
    pub fn new() -> Self {
        Self {
            magic: BAG_MAGIC,
            version: BAG_VERSION,
            start_time_us: 0,
            end_time_us: 0,
            frame_count: 0,
            reserved: [0; 8],
        }
    }

    pub fn duration_us(&self) -> u64 {
        self.end_time_us.saturating_sub(self.start_time_us)
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_us() as f64 / 1_000_000.0
    }
}

impl Default for BagHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary returned when a recording is finished.
#[derive(Debug, Clone)]
pub struct BagInfo {
    pub path: PathBuf,
    pub frame_count: u64,
    pub duration_us: u64,
    pub file_size: u64,
}

impl BagInfo {
    pub fn duration_secs(&self) -> f64 {
        self.duration_us as f64 / 1_000_000.0
    }
}

/// One segment of a subject in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSample {
    pub name: String,
    /// Parent segment; `None` for the root.
    pub parent: Option<String>,
    /// `[x, y, z, w]`, stream axes
    pub rotation: [f64; 4],
    /// Millimeters, stream axes
    pub translation: [f64; 3],
    /// Static scale, when the subject is scaled
    pub scale: Option<[f64; 3]>,
    pub occluded: bool,
}

/// One marker of a subject in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub name: String,
    pub parent: Option<String>,
    /// Global position in millimeters
    pub translation: [f64; 3],
    pub occluded: bool,
}

/// All data for one subject in one frame.
///
/// Segments are stored in skeleton pre-order; the first is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectFrame {
    pub name: String,
    pub segments: Vec<SegmentSample>,
    pub markers: Vec<MarkerRecord>,
}

impl SubjectFrame {
    pub fn root(&self) -> Option<&SegmentSample> {
        self.segments.iter().find(|s| s.parent.is_none())
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentSample> {
        self.segments.iter().find(|s| s.name == name)
    }

    pub fn marker(&self, name: &str) -> Option<&MarkerRecord> {
        self.markers.iter().find(|m| m.name == name)
    }

    /// Children of `segment` in stored order.
    pub fn children<'a>(&'a self, segment: &'a str) -> impl Iterator<Item = &'a SegmentSample> + 'a {
        self.segments
            .iter()
            .filter(move |s| s.parent.as_deref() == Some(segment))
    }
}

/// Everything the server reports for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame_number: u32,
    pub subjects: Vec<SubjectFrame>,
}

impl FrameSnapshot {
    pub fn subject(&self, name: &str) -> Option<&SubjectFrame> {
        self.subjects.iter().find(|s| s.name == name)
    }
}

/// One record of the capture stream.
pub type CaptureRecord = Timestamped<FrameSnapshot>;
