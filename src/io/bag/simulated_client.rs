//! Simulated capture-server client.
//!
//! Implements [`DataStreamClient`] over frames held in memory, loaded from a
//! capture file or built directly. Used for replay and as the test double for
//! everything above the protocol seam.

use std::path::{Path, PathBuf};

use super::Result;
use super::player::BagPlayer;
use super::types::{CaptureRecord, FrameSnapshot, MarkerRecord, SegmentSample, SubjectFrame};
use crate::io::protocol::{
    self, ClientError, DataStreamClient, Direction, QueryStatus, Reading, StreamMode,
};

/// A client replacement that serves recorded frames.
///
/// # Example
///
/// ```ignore
/// let client = SimulatedClient::from_bag("session.bag")?.looping(true);
/// let session = StreamSession::new(client, options);
/// ```
pub struct SimulatedClient {
    frames: Vec<FrameSnapshot>,
    cursor: Option<usize>,
    loop_playback: bool,
    finished: bool,
    frames_served: u64,

    connected: bool,
    failing_connects: u32,
    last_host: Option<String>,

    stream_mode: Option<StreamMode>,
    lightweight_supported: bool,
    lightweight_enabled: bool,
    segment_data_enabled: bool,
    marker_data_enabled: bool,
    axis_mapping: Option<(Direction, Direction, Direction)>,
    timing_log: Option<(PathBuf, PathBuf)>,

    filter: Vec<String>,
    filter_calls: usize,
    rotations_occluded: bool,
    last_update_offset: Option<f64>,
}

impl SimulatedClient {
    pub fn from_frames(frames: Vec<FrameSnapshot>) -> Self {
        Self {
            frames,
            cursor: None,
            loop_playback: false,
            finished: false,
            frames_served: 0,
            connected: false,
            failing_connects: 0,
            last_host: None,
            stream_mode: None,
            lightweight_supported: true,
            lightweight_enabled: false,
            segment_data_enabled: false,
            marker_data_enabled: false,
            axis_mapping: None,
            timing_log: None,
            filter: Vec::new(),
            filter_calls: 0,
            rotations_occluded: false,
            last_update_offset: None,
        }
    }

    pub fn from_records(records: Vec<CaptureRecord>) -> Self {
        Self::from_frames(records.into_iter().map(|r| r.data).collect())
    }

    /// Load every frame of a capture file.
    pub fn from_bag(path: impl AsRef<Path>) -> Result<Self> {
        let mut player = BagPlayer::open(path)?;
        let records = player.read_all()?;
        log::info!("Loaded {} frames from capture", records.len());
        Ok(Self::from_records(records))
    }

    /// Restart from the first frame once the last has been served.
    pub fn looping(mut self, enabled: bool) -> Self {
        self.loop_playback = enabled;
        self
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&mut self, n: u32) {
        self.failing_connects = n;
    }

    pub fn set_lightweight_supported(&mut self, supported: bool) {
        self.lightweight_supported = supported;
    }

    /// Report every segment rotation as occluded while translations still
    /// come through.
    pub fn occlude_rotations(&mut self, enabled: bool) {
        self.rotations_occluded = enabled;
    }

    pub fn last_host(&self) -> Option<&str> {
        self.last_host.as_deref()
    }

    pub fn stream_mode(&self) -> Option<StreamMode> {
        self.stream_mode
    }

    pub fn lightweight_enabled(&self) -> bool {
        self.lightweight_enabled
    }

    pub fn segment_data_enabled(&self) -> bool {
        self.segment_data_enabled
    }

    pub fn axis_mapping(&self) -> Option<(Direction, Direction, Direction)> {
        self.axis_mapping
    }

    pub fn timing_log(&self) -> Option<&(PathBuf, PathBuf)> {
        self.timing_log.as_ref()
    }

    /// Number of `add_to_subject_filter` calls received.
    pub fn filter_calls(&self) -> usize {
        self.filter_calls
    }

    /// Offset passed to the most recent `update_frame`.
    pub fn last_update_offset(&self) -> Option<f64> {
        self.last_update_offset
    }

    pub fn frames_served(&self) -> u64 {
        self.frames_served
    }

    /// True once the last frame was served without looping.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn advance(&mut self) -> QueryStatus {
        if !self.connected {
            return QueryStatus::NotAvailable;
        }
        if self.frames.is_empty() {
            return QueryStatus::NotAvailable;
        }
        let next = match self.cursor {
            None => 0,
            Some(i) if i + 1 < self.frames.len() => i + 1,
            Some(_) if self.loop_playback => 0,
            Some(_) => {
                // keep serving the last frame
                self.finished = true;
                return QueryStatus::NotAvailable;
            }
        };
        self.cursor = Some(next);
        self.frames_served += 1;
        QueryStatus::Success
    }

    fn current(&self) -> Option<&FrameSnapshot> {
        if !self.connected {
            return None;
        }
        self.cursor.and_then(|i| self.frames.get(i))
    }

    fn visible(&self, subject: &str) -> bool {
        self.filter.is_empty() || self.filter.iter().any(|f| f == subject)
    }

    fn visible_subjects(&self) -> impl Iterator<Item = &SubjectFrame> {
        self.current()
            .into_iter()
            .flat_map(|f| f.subjects.iter())
            .filter(move |s| self.visible(&s.name))
    }

    fn subject(&self, name: &str) -> Option<&SubjectFrame> {
        self.visible_subjects().find(|s| s.name == name)
    }

    fn segment(&self, subject: &str, segment: &str) -> Option<&SegmentSample> {
        self.subject(subject).and_then(|s| s.segment(segment))
    }

    fn marker(&self, subject: &str, marker: &str) -> Option<&MarkerRecord> {
        if !self.marker_data_enabled {
            return None;
        }
        self.subject(subject).and_then(|s| s.marker(marker))
    }

    fn pose<T>(segment: Option<&SegmentSample>, value: impl FnOnce(&SegmentSample) -> T) -> Reading<T>
    where
        T: Default,
    {
        match segment {
            Some(s) if s.occluded => Reading::occluded(value(s)),
            Some(s) => Reading::success(value(s)),
            None => Reading::not_available(),
        }
    }

    fn found<T: Default>(value: Option<T>) -> Reading<T> {
        value.map_or_else(Reading::not_available, Reading::success)
    }
}

impl DataStreamClient for SimulatedClient {
    fn connect(&mut self, host: &str) -> protocol::Result<()> {
        self.last_host = Some(host.to_string());
        if self.failing_connects > 0 {
            self.failing_connects -= 1;
            return Err(ClientError::ConnectFailed {
                host: host.to_string(),
                reason: "simulated refusal".into(),
            });
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.cursor = None;
        self.filter.clear();
        self.stream_mode = None;
        self.lightweight_enabled = false;
        self.segment_data_enabled = false;
        self.marker_data_enabled = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_stream_mode(&mut self, mode: StreamMode) -> QueryStatus {
        if !self.connected {
            return QueryStatus::NotAvailable;
        }
        self.stream_mode = Some(mode);
        QueryStatus::Success
    }

    fn enable_segment_data(&mut self) -> QueryStatus {
        self.segment_data_enabled = self.connected;
        status_from(self.connected)
    }

    fn enable_lightweight_segment_data(&mut self) -> QueryStatus {
        if !self.lightweight_supported {
            return QueryStatus::NotSupportedInMode;
        }
        self.lightweight_enabled = self.connected;
        status_from(self.connected)
    }

    fn enable_marker_data(&mut self) -> QueryStatus {
        self.marker_data_enabled = self.connected;
        status_from(self.connected)
    }

    fn is_marker_data_enabled(&self) -> bool {
        self.marker_data_enabled
    }

    fn set_axis_mapping(&mut self, forward: Direction, left: Direction, up: Direction) -> QueryStatus {
        self.axis_mapping = Some((forward, left, up));
        QueryStatus::Success
    }

    fn set_timing_log(&mut self, client_log: &Path, stream_log: &Path) -> QueryStatus {
        self.timing_log = Some((client_log.to_path_buf(), stream_log.to_path_buf()));
        QueryStatus::Success
    }

    fn add_to_subject_filter(&mut self, subject: &str) -> QueryStatus {
        self.filter_calls += 1;
        let known = self
            .frames
            .iter()
            .any(|f| f.subjects.iter().any(|s| s.name == subject));
        if !self.connected || !known {
            return QueryStatus::NotAvailable;
        }
        if !self.filter.iter().any(|f| f == subject) {
            self.filter.push(subject.to_string());
        }
        QueryStatus::Success
    }

    fn get_frame(&mut self) -> QueryStatus {
        self.advance()
    }

    fn update_frame(&mut self, offset: f64) -> QueryStatus {
        self.last_update_offset = Some(offset);
        self.advance()
    }

    fn frame_number(&self) -> Reading<u32> {
        Self::found(self.current().map(|f| f.frame_number))
    }

    fn subject_count(&self) -> Reading<usize> {
        if self.current().is_none() {
            return Reading::not_available();
        }
        Reading::success(self.visible_subjects().count())
    }

    fn subject_name(&self, index: usize) -> Reading<String> {
        Self::found(self.visible_subjects().nth(index).map(|s| s.name.clone()))
    }

    fn subject_root_segment_name(&self, subject: &str) -> Reading<String> {
        Self::found(
            self.subject(subject)
                .and_then(|s| s.root())
                .map(|r| r.name.clone()),
        )
    }

    fn segment_count(&self, subject: &str) -> Reading<usize> {
        Self::found(self.subject(subject).map(|s| s.segments.len()))
    }

    fn segment_name(&self, subject: &str, index: usize) -> Reading<String> {
        Self::found(
            self.subject(subject)
                .and_then(|s| s.segments.get(index))
                .map(|seg| seg.name.clone()),
        )
    }

    fn segment_child_count(&self, subject: &str, segment: &str) -> Reading<usize> {
        let subject = self.subject(subject);
        Self::found(
            subject
                .filter(|s| s.segment(segment).is_some())
                .map(|s| s.children(segment).count()),
        )
    }

    fn segment_child_name(&self, subject: &str, segment: &str, index: usize) -> Reading<String> {
        Self::found(
            self.subject(subject)
                .and_then(|s| s.children(segment).nth(index))
                .map(|c| c.name.clone()),
        )
    }

    fn segment_parent_name(&self, subject: &str, segment: &str) -> Reading<String> {
        Self::found(self.segment(subject, segment).and_then(|s| s.parent.clone()))
    }

    fn segment_rotation(&self, subject: &str, segment: &str) -> Reading<[f64; 4]> {
        let reading = Self::pose(self.segment(subject, segment), |s| s.rotation);
        if self.rotations_occluded && reading.status.is_success() {
            return Reading::occluded(reading.value);
        }
        reading
    }

    fn segment_translation(&self, subject: &str, segment: &str) -> Reading<[f64; 3]> {
        Self::pose(self.segment(subject, segment), |s| s.translation)
    }

    fn segment_static_scale(&self, subject: &str, segment: &str) -> Reading<[f64; 3]> {
        Self::found(self.segment(subject, segment).and_then(|s| s.scale))
    }

    fn marker_count(&self, subject: &str) -> Reading<usize> {
        if !self.marker_data_enabled {
            return Reading::not_available();
        }
        Self::found(self.subject(subject).map(|s| s.markers.len()))
    }

    fn marker_name(&self, subject: &str, index: usize) -> Reading<String> {
        if !self.marker_data_enabled {
            return Reading::not_available();
        }
        Self::found(
            self.subject(subject)
                .and_then(|s| s.markers.get(index))
                .map(|m| m.name.clone()),
        )
    }

    fn marker_parent_name(&self, subject: &str, marker: &str) -> Reading<String> {
        Self::found(self.marker(subject, marker).and_then(|m| m.parent.clone()))
    }

    fn marker_global_translation(&self, subject: &str, marker: &str) -> Reading<[f64; 3]> {
        match self.marker(subject, marker) {
            Some(m) if m.occluded => Reading::occluded(m.translation),
            Some(m) => Reading::success(m.translation),
            None => Reading::not_available(),
        }
    }
}

fn status_from(ok: bool) -> QueryStatus {
    if ok {
        QueryStatus::Success
    } else {
        QueryStatus::NotAvailable
    }
}
