//! Capture files: recording and replay of frame snapshots.
//!
//! A capture holds the per-frame subject data a live session would serve,
//! so the whole pipeline can run without a capture server.
//!
//! # File Format
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Header (64 bytes, postcard, zero padded)         │
//! │ - Magic: "MOCP" (4 bytes)                        │
//! │ - Version: u16                                   │
//! │ - Start time: u64 (microseconds)                 │
//! │ - End time: u64 (microseconds)                   │
//! │ - Frame count: u64                               │
//! │ - Reserved: 8 bytes                              │
//! ├──────────────────────────────────────────────────┤
//! │ Frame Stream                                     │
//! │ [len:u32 LE][postcard Timestamped<FrameSnapshot>]│
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut recorder = BagRecorder::create("session.bag")?;
//! recorder.record(&Timestamped::new(frame, now_us()))?;
//! recorder.finish()?;
//!
//! let client = SimulatedClient::from_bag("session.bag")?;
//! ```

mod player;
mod recorder;
mod simulated_client;
pub mod synth;
mod types;

pub use player::BagPlayer;
pub use recorder::BagRecorder;
pub use simulated_client::SimulatedClient;
pub use types::{
    BAG_MAGIC, BAG_VERSION, BagHeader, BagInfo, CaptureRecord, FrameSnapshot, HEADER_SIZE,
    MarkerRecord, SegmentSample, SubjectFrame,
};

/// Capture file errors
#[derive(Debug, thiserror::Error)]
pub enum BagError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    #[error("Not a capture file (bad magic)")]
    InvalidMagic,

    #[error("Unsupported capture version {0}")]
    UnsupportedVersion(u16),

    #[error("Header exceeds {HEADER_SIZE} bytes ({0})")]
    HeaderTooLarge(usize),

    #[error("Record too large: {0} bytes")]
    RecordTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, BagError>;
