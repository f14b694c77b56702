//! Stream session: one logical connection to the capture server.
//!
//! The session owns the protocol client and layers on top of it:
//! - the connect/retry loop across redundant hosts
//! - channel configuration with lightweight-data fallback
//! - the idempotent subject filter
//! - mode-aware queries (retimed acquisition cannot answer marker or
//!   parent-name queries, so those report `NotSupportedInMode`)
//! - the derived scale-compensated segment translation
//!
//! # Connection state
//!
//! ```text
//! Disconnected ──connect()──> Connecting ──configure()──> Connected
//!      ^                                                      │
//!      └───────────────────────disconnect()───────────────────┘
//! ```
//!
//! Access to the client is serialized through a mutex. The acquisition mode
//! decides which thread fetches frames; the other only reads. A reader that
//! needs several queries to see the same frame holds
//! [`hold_frame`](StreamSession::hold_frame) across them, which keeps the
//! fetching side from advancing the frame in between.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::config::{Config, TimingLogConfig};
use crate::core::types::Vec3;
use crate::io::hosts::HostList;
use crate::io::protocol::{
    ClientError, DataStreamClient, Direction, QueryStatus, Reading, Result, StreamMode,
};

/// Upper bound on parent-chain walks, guards against malformed hierarchies.
const MAX_SEGMENT_DEPTH: usize = 256;

/// How frames are acquired for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    ServerPush,
    ClientPullPreFetch,
    /// Frames are resampled on the consumer's update tick.
    Retimed,
}

impl AcquisitionMode {
    pub fn is_retimed(self) -> bool {
        self == AcquisitionMode::Retimed
    }

    /// Stream mode for the non-retimed channel.
    pub fn stream_mode(self) -> Option<StreamMode> {
        match self {
            AcquisitionMode::ServerPush => Some(StreamMode::ServerPush),
            AcquisitionMode::ClientPullPreFetch => Some(StreamMode::ClientPullPreFetch),
            AcquisitionMode::Retimed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Session settings, fixed for the lifetime of a connection.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub hosts: HostList,
    pub mode: AcquisitionMode,
    pub lightweight: bool,
    pub marker_data: bool,
    /// Seconds, passed to every retimed update.
    pub retime_offset: f64,
    pub subject_filter: Vec<String>,
    pub retry_delay: Duration,
    /// `(client, stream)` timing log paths.
    pub timing_log: Option<(PathBuf, PathBuf)>,
}

impl SessionOptions {
    pub fn new(hosts: HostList, mode: AcquisitionMode) -> Self {
        Self {
            hosts,
            mode,
            lightweight: true,
            marker_data: true,
            retime_offset: 0.0,
            subject_filter: Vec::new(),
            retry_delay: Duration::from_millis(200),
            timing_log: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let stream = &config.stream;
        Self {
            hosts: stream.host_list(),
            mode: stream.acquisition_mode(),
            lightweight: stream.lightweight,
            marker_data: stream.marker_data,
            retime_offset: stream.retime_offset,
            subject_filter: stream.subject_filter.clone(),
            retry_delay: Duration::from_millis(stream.connect_retry_ms),
            timing_log: timing_log_paths(&config.timing_log),
        }
    }
}

fn timing_log_paths(cfg: &TimingLogConfig) -> Option<(PathBuf, PathBuf)> {
    cfg.enabled
        .then(|| cfg.paths_for(chrono::Local::now().date_naive()))
}

/// A marker position read from the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSample {
    pub name: String,
    /// Segment the marker is attached to, if any.
    pub parent: Option<String>,
    /// Global position in millimeters, stream axes.
    pub translation_mm: Vec3,
    pub occluded: bool,
}

/// Pins the current frame until dropped.
pub type FrameHold<'a> = RwLockReadGuard<'a, ()>;

/// Connection to one or more redundant capture servers.
pub struct StreamSession<C: DataStreamClient> {
    client: Mutex<C>,
    frame_lock: RwLock<()>,
    options: SessionOptions,
    state: AtomicU8,
    filter_set: AtomicBool,
    connect_attempts: AtomicU64,
}

impl<C: DataStreamClient> StreamSession<C> {
    pub fn new(client: C, options: SessionOptions) -> Self {
        Self {
            client: Mutex::new(client),
            frame_lock: RwLock::new(()),
            options,
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
            filter_set: AtomicBool::new(false),
            connect_attempts: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.options.mode
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once connected and configured.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// True once any subject of the filter has been accepted.
    pub fn is_filter_set(&self) -> bool {
        self.filter_set.load(Ordering::Acquire)
    }

    /// Total connect attempts over the session's lifetime.
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    /// Run `f` with exclusive access to the underlying client.
    pub fn with_client<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.client.lock())
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    // ========================================================================
    // Connection lifecycle
    // ========================================================================

    /// Connect, retrying every `retry_delay` until success or until `running`
    /// is cleared.
    ///
    /// Leaves the session `Connecting`; [`configure`](Self::configure) moves
    /// it to `Connected`.
    pub fn connect(&self, running: &AtomicBool) -> Result<()> {
        if self.options.hosts.is_empty() {
            return Err(ClientError::NoHosts);
        }
        let host = self.options.hosts.connection_string();
        self.set_state(ConnectionState::Connecting);
        log::info!("Connecting to {}", host);

        loop {
            if !running.load(Ordering::Relaxed) {
                self.set_state(ConnectionState::Disconnected);
                log::info!("Connect to {} cancelled", host);
                return Err(ClientError::Cancelled);
            }

            let attempt = self.connect_attempts.fetch_add(1, Ordering::Relaxed) + 1;
            let result = self.client.lock().connect(&host);
            match result {
                Ok(()) => {
                    log::info!("Connected to {} (attempt {})", host, attempt);
                    break;
                }
                Err(e) => {
                    log::debug!("Connect attempt {} failed: {}", attempt, e);
                }
            }
            thread::sleep(self.options.retry_delay);
        }

        if let Some((client_log, stream_log)) = &self.options.timing_log {
            let status = self.client.lock().set_timing_log(client_log, stream_log);
            if status.is_success() {
                log::info!(
                    "Timing logs: {} / {}",
                    client_log.display(),
                    stream_log.display()
                );
            } else {
                log::warn!("Timing log setup failed: {:?}", status);
            }
        }
        Ok(())
    }

    /// Configure data channels and mark the session connected.
    ///
    /// Non-retimed: sets the stream mode and fetches one frame before enabling
    /// channels, since the server negotiates capabilities against live data.
    pub fn configure(&self) -> Result<()> {
        if self.state() == ConnectionState::Disconnected {
            return Err(ClientError::NotConnected);
        }

        if let Some(stream_mode) = self.options.mode.stream_mode() {
            let status = self.client.lock().set_stream_mode(stream_mode);
            log::info!("Stream mode {:?}: {:?}", stream_mode, status);

            let frame = self.fetch_frame();
            if !frame.is_success() {
                log::warn!("No frame before channel setup: {:?}", frame);
            }
        }

        let mut client = self.client.lock();
        let lightweight = self.options.lightweight
            && client.enable_lightweight_segment_data().is_success();
        if lightweight {
            log::info!("Lightweight segment data enabled");
        } else {
            if self.options.lightweight {
                log::warn!("Lightweight segment data unsupported, using standard");
            }
            let status = client.enable_segment_data();
            log::info!("Segment data: {:?}", status);
        }

        if !self.options.mode.is_retimed() && self.options.marker_data {
            let status = client.enable_marker_data();
            log::info!("Marker data: {:?}", status);
        }

        let status = client.set_axis_mapping(Direction::Forward, Direction::Left, Direction::Up);
        if !status.is_success() {
            log::warn!("Axis mapping rejected: {:?}", status);
        }
        drop(client);

        self.set_state(ConnectionState::Connected);
        log::info!("Session configured ({:?})", self.options.mode);
        Ok(())
    }

    /// Disconnect and reset per-connection state.
    pub fn disconnect(&self) {
        self.client.lock().disconnect();
        self.filter_set.store(false, Ordering::Release);
        self.set_state(ConnectionState::Disconnected);
        log::info!("Disconnected from {}", self.options.hosts);
    }

    // ========================================================================
    // Frame acquisition
    // ========================================================================

    /// Fetch a new frame (push/pull) and apply the subject filter if pending.
    pub fn fetch_frame(&self) -> QueryStatus {
        let status = {
            let _advance = self.frame_lock.write();
            self.client.lock().get_frame()
        };
        self.apply_configured_filter();
        status
    }

    /// Resample the retimed stream using the configured offset.
    pub fn update_frame(&self) -> QueryStatus {
        let status = {
            let _advance = self.frame_lock.write();
            self.client.lock().update_frame(self.options.retime_offset)
        };
        self.apply_configured_filter();
        status
    }

    /// Keep the current frame in place until the returned guard drops.
    ///
    /// Must not be held across [`fetch_frame`](Self::fetch_frame) or
    /// [`update_frame`](Self::update_frame) on the same thread.
    pub fn hold_frame(&self) -> FrameHold<'_> {
        self.frame_lock.read()
    }

    fn apply_configured_filter(&self) {
        if !self.options.subject_filter.is_empty() && !self.is_filter_set() {
            self.apply_subject_filter(&self.options.subject_filter);
        }
    }

    /// Restrict the stream to `names`. No-op once a filter has been accepted.
    ///
    /// Returns whether a filter is in effect after the call.
    pub fn apply_subject_filter<S: AsRef<str>>(&self, names: &[S]) -> bool {
        if self.is_filter_set() {
            return true;
        }
        let mut client = self.client.lock();
        let mut accepted = false;
        for name in names.iter().map(|n| n.as_ref().trim()) {
            if name.is_empty() {
                continue;
            }
            let status = client.add_to_subject_filter(name);
            log::debug!("Subject filter '{}': {:?}", name, status);
            accepted |= status.is_success();
        }
        if accepted {
            self.filter_set.store(true, Ordering::Release);
            log::info!("Subject filter applied");
        }
        accepted
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Frame number of the current frame. Always 0 when retimed.
    pub fn frame_number(&self) -> Reading<u32> {
        if self.options.mode.is_retimed() {
            return Reading::not_supported();
        }
        self.client.lock().frame_number()
    }

    pub fn subject_count(&self) -> Reading<usize> {
        self.client.lock().subject_count()
    }

    pub fn subject_name(&self, index: usize) -> Reading<String> {
        self.client.lock().subject_name(index)
    }

    /// All subject names visible in the current frame.
    pub fn subject_names(&self) -> Vec<String> {
        let client = self.client.lock();
        let count = client.subject_count().ok().unwrap_or(0);
        (0..count)
            .filter_map(|i| client.subject_name(i).ok())
            .collect()
    }

    pub fn subject_root_segment_name(&self, subject: &str) -> Reading<String> {
        self.client.lock().subject_root_segment_name(subject)
    }

    pub fn segment_count(&self, subject: &str) -> Reading<usize> {
        self.client.lock().segment_count(subject)
    }

    pub fn segment_name(&self, subject: &str, index: usize) -> Reading<String> {
        self.client.lock().segment_name(subject, index)
    }

    pub fn segment_child_count(&self, subject: &str, segment: &str) -> Reading<usize> {
        self.client.lock().segment_child_count(subject, segment)
    }

    pub fn segment_child_name(&self, subject: &str, segment: &str, index: usize) -> Reading<String> {
        self.client.lock().segment_child_name(subject, segment, index)
    }

    /// Parent segment name. Not available when retimed.
    pub fn segment_parent_name(&self, subject: &str, segment: &str) -> Reading<String> {
        if self.options.mode.is_retimed() {
            return Reading::not_supported();
        }
        self.client.lock().segment_parent_name(subject, segment)
    }

    pub fn segment_rotation(&self, subject: &str, segment: &str) -> Reading<[f64; 4]> {
        self.client.lock().segment_rotation(subject, segment)
    }

    pub fn segment_translation(&self, subject: &str, segment: &str) -> Reading<[f64; 3]> {
        self.client.lock().segment_translation(subject, segment)
    }

    pub fn segment_static_scale(&self, subject: &str, segment: &str) -> Reading<[f64; 3]> {
        self.client.lock().segment_static_scale(subject, segment)
    }

    /// Segment translation divided by the per-axis scale of the segment and
    /// every ancestor.
    ///
    /// A root segment (no parent) is returned unchanged. Axes with a zero
    /// scale are left out of the product. When parent links cannot be
    /// queried (retimed) the raw translation is returned.
    pub fn scaled_segment_translation(&self, subject: &str, segment: &str) -> Reading<[f64; 3]> {
        let retimed = self.options.mode.is_retimed();
        let client = self.client.lock();
        let raw = client.segment_translation(subject, segment);
        if retimed || !raw.status.is_success() {
            return raw;
        }
        if !client.segment_parent_name(subject, segment).status.is_success() {
            return raw;
        }

        let mut product = Vec3::ONE;
        let mut current = segment.to_string();
        for _ in 0..MAX_SEGMENT_DEPTH {
            let scale = client.segment_static_scale(subject, &current);
            if scale.status.is_success() {
                let s = Vec3::from_array(scale.value);
                let axis = |p: f64, s: f64| if s == 0.0 { p } else { p * s };
                product = Vec3::new(axis(product.x, s.x), axis(product.y, s.y), axis(product.z, s.z));
            }
            let parent = client.segment_parent_name(subject, &current);
            if !parent.status.is_success() || parent.value.is_empty() {
                break;
            }
            current = parent.value;
        }

        raw.map(|t| Vec3::from_array(t).component_div(&product).to_array())
    }

    // ========================================================================
    // Markers (non-retimed only)
    // ========================================================================

    pub fn marker_count(&self, subject: &str) -> Reading<usize> {
        if self.options.mode.is_retimed() {
            return Reading::not_supported();
        }
        self.client.lock().marker_count(subject)
    }

    pub fn marker_name(&self, subject: &str, index: usize) -> Reading<String> {
        if self.options.mode.is_retimed() {
            return Reading::not_supported();
        }
        self.client.lock().marker_name(subject, index)
    }

    pub fn marker_parent_name(&self, subject: &str, marker: &str) -> Reading<String> {
        if self.options.mode.is_retimed() {
            return Reading::not_supported();
        }
        self.client.lock().marker_parent_name(subject, marker)
    }

    pub fn marker_global_translation(&self, subject: &str, marker: &str) -> Reading<[f64; 3]> {
        if self.options.mode.is_retimed() {
            return Reading::not_supported();
        }
        self.client.lock().marker_global_translation(subject, marker)
    }

    /// Every marker of `subject` in the current frame. Empty when retimed.
    pub fn marker_samples(&self, subject: &str) -> Vec<MarkerSample> {
        if self.options.mode.is_retimed() {
            return Vec::new();
        }
        let client = self.client.lock();
        let count = client.marker_count(subject).ok().unwrap_or(0);
        (0..count)
            .filter_map(|i| client.marker_name(subject, i).ok())
            .map(|name| {
                let parent = client
                    .marker_parent_name(subject, &name)
                    .ok()
                    .filter(|p| !p.is_empty());
                let t = client.marker_global_translation(subject, &name);
                MarkerSample {
                    occluded: !t.is_valid(),
                    translation_mm: Vec3::from_array(t.value),
                    parent,
                    name,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::bag::{SegmentSample, SimulatedClient, SubjectFrame};
    use crate::io::bag::FrameSnapshot;
    use crate::io::hosts::DEFAULT_PORT;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn chain_frame(scales: [[f64; 3]; 3]) -> FrameSnapshot {
        let seg = |name: &str, parent: Option<&str>, t: [f64; 3], s: [f64; 3]| SegmentSample {
            name: name.into(),
            parent: parent.map(Into::into),
            rotation: [0.0, 0.0, 0.0, 1.0],
            translation: t,
            scale: Some(s),
            occluded: false,
        };
        FrameSnapshot {
            frame_number: 7,
            subjects: vec![SubjectFrame {
                name: "Arm".into(),
                segments: vec![
                    seg("Root", None, [100.0, 200.0, 300.0], scales[0]),
                    seg("Upper", Some("Root"), [0.0, 0.0, 400.0], scales[1]),
                    seg("Lower", Some("Upper"), [120.0, 60.0, 300.0], scales[2]),
                ],
                markers: Vec::new(),
            }],
        }
    }

    fn session(frames: Vec<FrameSnapshot>, mode: AcquisitionMode) -> StreamSession<SimulatedClient> {
        let mut options = SessionOptions::new(HostList::parse("localhost", DEFAULT_PORT), mode);
        options.retry_delay = Duration::from_millis(1);
        StreamSession::new(SimulatedClient::from_frames(frames), options)
    }

    fn connected(frames: Vec<FrameSnapshot>, mode: AcquisitionMode) -> StreamSession<SimulatedClient> {
        let s = session(frames, mode);
        s.connect(&AtomicBool::new(true)).unwrap();
        s.configure().unwrap();
        s.fetch_frame();
        s
    }

    #[test]
    fn test_connect_retries_until_success() {
        let s = session(vec![chain_frame([[1.0; 3]; 3])], AcquisitionMode::ServerPush);
        s.with_client(|c| c.fail_next_connects(3));

        s.connect(&AtomicBool::new(true)).unwrap();
        assert_eq!(s.connect_attempts(), 4);
        assert_eq!(s.state(), ConnectionState::Connecting);

        s.configure().unwrap();
        assert!(s.is_connected());
        assert_eq!(s.with_client(|c| c.last_host().map(str::to_string)), Some("localhost:801".into()));
    }

    #[test]
    fn test_connect_cancelled() {
        let s = session(Vec::new(), AcquisitionMode::ServerPush);
        s.with_client(|c| c.fail_next_connects(u32::MAX));
        let result = s.connect(&AtomicBool::new(false));
        assert_eq!(result, Err(ClientError::Cancelled));
        assert_eq!(s.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_configure_requires_connect() {
        let s = session(Vec::new(), AcquisitionMode::ServerPush);
        assert_eq!(s.configure(), Err(ClientError::NotConnected));
    }

    #[test]
    fn test_lightweight_fallback() {
        let s = session(vec![chain_frame([[1.0; 3]; 3])], AcquisitionMode::ClientPullPreFetch);
        s.with_client(|c| c.set_lightweight_supported(false));
        s.connect(&AtomicBool::new(true)).unwrap();
        s.configure().unwrap();
        let (lightweight, standard, markers) = s.with_client(|c| {
            (c.lightweight_enabled(), c.segment_data_enabled(), c.is_marker_data_enabled())
        });
        assert!(!lightweight);
        assert!(standard);
        assert!(markers);
        assert_eq!(s.with_client(|c| c.stream_mode()), Some(StreamMode::ClientPullPreFetch));
    }

    #[test]
    fn test_subject_filter_idempotent() {
        let s = connected(vec![chain_frame([[1.0; 3]; 3])], AcquisitionMode::ServerPush);
        assert!(!s.is_filter_set());

        assert!(s.apply_subject_filter(&["Arm", " "]));
        assert!(s.is_filter_set());
        let calls = s.with_client(|c| c.filter_calls());

        assert!(s.apply_subject_filter(&["Arm"]));
        assert_eq!(s.with_client(|c| c.filter_calls()), calls);

        s.disconnect();
        assert!(!s.is_filter_set());
    }

    #[test]
    fn test_scaled_translation_root_unchanged() {
        let s = connected(vec![chain_frame([[2.0; 3]; 3])], AcquisitionMode::ServerPush);
        let root = s.scaled_segment_translation("Arm", "Root");
        assert_eq!(root.value, [100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_scaled_translation_unit_scale_idempotent() {
        let s = connected(vec![chain_frame([[1.0; 3]; 3])], AcquisitionMode::ServerPush);
        let scaled = s.scaled_segment_translation("Arm", "Lower");
        let raw = s.segment_translation("Arm", "Lower");
        assert_eq!(scaled.value, raw.value);
        assert!(scaled.is_valid());
    }

    #[test]
    fn test_scaled_translation_divides_chain_product() {
        let scales = [[2.0, 1.0, 0.0], [1.0, 3.0, 2.0], [1.5, 2.0, 0.0]];
        let s = connected(vec![chain_frame(scales)], AcquisitionMode::ServerPush);
        let t = s.scaled_segment_translation("Arm", "Lower").value;
        // x: 2 * 1 * 1.5, y: 1 * 3 * 2, z: zeros skipped -> 2
        assert_relative_eq!(t[0], 120.0 / 3.0);
        assert_relative_eq!(t[1], 60.0 / 6.0);
        assert_relative_eq!(t[2], 300.0 / 2.0);
    }

    #[test]
    fn test_retimed_marker_queries_unsupported() {
        let s = connected(vec![chain_frame([[1.0; 3]; 3])], AcquisitionMode::Retimed);
        s.update_frame();

        let count = s.marker_count("Arm");
        assert_eq!(count.status, QueryStatus::NotSupportedInMode);
        assert_eq!(count.value, 0);
        assert_eq!(
            s.segment_parent_name("Arm", "Upper").status,
            QueryStatus::NotSupportedInMode
        );
        assert_eq!(s.frame_number().value, 0);
        assert!(s.marker_samples("Arm").is_empty());
        // no parent links: raw translation
        assert_eq!(s.scaled_segment_translation("Arm", "Lower").value, [120.0, 60.0, 300.0]);
    }

    #[test]
    fn test_retimed_configure_skips_stream_mode_and_markers() {
        let s = connected(vec![chain_frame([[1.0; 3]; 3])], AcquisitionMode::Retimed);
        let (mode, markers) = s.with_client(|c| (c.stream_mode(), c.is_marker_data_enabled()));
        assert_eq!(mode, None);
        assert!(!markers);
    }

    #[test]
    fn test_timing_log_configured_on_connect() {
        let mut options = SessionOptions::new(HostList::parse("a;b:9", 801), AcquisitionMode::ServerPush);
        options.timing_log = Some(("c.csv".into(), "s.csv".into()));
        let s = StreamSession::new(SimulatedClient::from_frames(Vec::new()), options);
        s.connect(&AtomicBool::new(true)).unwrap();
        let logs = s.with_client(|c| c.timing_log().cloned());
        assert_eq!(logs, Some((PathBuf::from("c.csv"), PathBuf::from("s.csv"))));
        assert_eq!(s.with_client(|c| c.last_host().map(str::to_string)), Some("a:801;b:9".into()));
    }

    #[test]
    fn test_hold_frame_blocks_fetch_until_released() {
        let frames = [1.0, 2.0, 3.0].into_iter().map(|k| chain_frame([[k; 3]; 3])).collect();
        let s = Arc::new(connected(frames, AcquisitionMode::ServerPush));
        let served = s.with_client(|c| c.frames_served());

        let hold = s.hold_frame();
        let fetcher = {
            let s = Arc::clone(&s);
            thread::spawn(move || s.fetch_frame())
        };
        thread::sleep(Duration::from_millis(30));
        assert_eq!(s.with_client(|c| c.frames_served()), served);
        assert_relative_eq!(s.segment_static_scale("Arm", "Root").value[0], 2.0);

        drop(hold);
        assert_eq!(fetcher.join().unwrap(), QueryStatus::Success);
        assert_eq!(s.with_client(|c| c.frames_served()), served + 1);
        assert_relative_eq!(s.segment_static_scale("Arm", "Root").value[0], 3.0);
    }
}
