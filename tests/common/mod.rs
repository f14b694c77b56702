//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

use mocap_retarget::io::bag::{FrameSnapshot, MarkerRecord, SegmentSample, SimulatedClient, SubjectFrame};
use mocap_retarget::{AcquisitionMode, HostList, Quaternion, SessionOptions, StreamSession, Vec3};

pub const IDENTITY: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

pub fn segment(name: &str, parent: Option<&str>, rotation: [f64; 4], translation: [f64; 3]) -> SegmentSample {
    SegmentSample {
        name: name.into(),
        parent: parent.map(Into::into),
        rotation,
        translation,
        scale: None,
        occluded: false,
    }
}

/// Quarter turn about the stream's up axis (z).
pub fn quarter_turn_z() -> [f64; 4] {
    Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), std::f64::consts::FRAC_PI_2).to_xyzw()
}

/// "Arm": Root → Upper → Lower, positions in millimeters.
pub fn arm_subject(upper_rotation: [f64; 4], root_mm: [f64; 3]) -> SubjectFrame {
    SubjectFrame {
        name: "Arm".into(),
        segments: vec![
            segment("Root", None, IDENTITY, root_mm),
            segment("Upper", Some("Root"), upper_rotation, [0.0, 0.0, 300.0]),
            segment("Lower", Some("Upper"), IDENTITY, [250.0, 0.0, 0.0]),
        ],
        markers: vec![MarkerRecord {
            name: "Elbow".into(),
            parent: Some("Upper".into()),
            translation: [10.0, 20.0, 30.0],
            occluded: false,
        }],
    }
}

pub fn frame(frame_number: u32, subjects: Vec<SubjectFrame>) -> FrameSnapshot {
    FrameSnapshot {
        frame_number,
        subjects,
    }
}

pub fn options(mode: AcquisitionMode) -> SessionOptions {
    let mut options = SessionOptions::new(HostList::parse("localhost", 801), mode);
    options.retry_delay = Duration::from_millis(1);
    options
}

/// Connected and configured session. Non-retimed sessions serve frame 0.
pub fn connected_session(client: SimulatedClient, options: SessionOptions) -> StreamSession<SimulatedClient> {
    let session = StreamSession::new(client, options);
    session.connect(&AtomicBool::new(true)).unwrap();
    session.configure().unwrap();
    session
}

pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}
