//! Synthetic capture frames for demos and tests.

use std::f64::consts::PI;

use super::types::{FrameSnapshot, MarkerRecord, SegmentSample, SubjectFrame};
use crate::core::types::{Quaternion, Vec3};

/// Description of one synthetic segment.
struct SegmentSpec {
    name: &'static str,
    parent: Option<&'static str>,
    /// Offset from parent in millimeters
    offset: [f64; 3],
}

const ARM: [SegmentSpec; 3] = [
    SegmentSpec {
        name: "Root",
        parent: None,
        offset: [0.0, 0.0, 1200.0],
    },
    SegmentSpec {
        name: "Upper",
        parent: Some("Root"),
        offset: [0.0, 0.0, 300.0],
    },
    SegmentSpec {
        name: "Lower",
        parent: Some("Upper"),
        offset: [250.0, 0.0, 0.0],
    },
];

/// A three-segment arm swinging about the stream's up axis.
///
/// `t` is seconds since the start of the capture.
pub fn arm_subject(t: f64) -> SubjectFrame {
    let swing = (2.0 * PI * 0.5 * t).sin() * 0.6;
    let segments = ARM
        .iter()
        .enumerate()
        .map(|(depth, spec)| {
            let q = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), swing * depth as f64);
            SegmentSample {
                name: spec.name.into(),
                parent: spec.parent.map(Into::into),
                rotation: q.to_xyzw(),
                translation: spec.offset,
                scale: Some([1.0; 3]),
                occluded: false,
            }
        })
        .collect();
    SubjectFrame {
        name: "Arm".into(),
        segments,
        markers: Vec::new(),
    }
}

/// A wand circling the volume with three markers.
pub fn wand_subject(t: f64) -> SubjectFrame {
    let angle = 2.0 * PI * 0.25 * t;
    let center = [1000.0 * angle.cos(), 1000.0 * angle.sin(), 900.0];
    let q = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), angle);
    let markers = (0..3)
        .map(|i| {
            let local = Vec3::new(40.0 * i as f64, 0.0, 0.0);
            let p = q.rotate(local) + Vec3::from_array(center);
            MarkerRecord {
                name: format!("Wand{}", i + 1),
                parent: Some("Wand".into()),
                translation: p.to_array(),
                occluded: false,
            }
        })
        .collect();
    SubjectFrame {
        name: "Wand".into(),
        segments: vec![SegmentSample {
            name: "Wand".into(),
            parent: None,
            rotation: q.to_xyzw(),
            translation: center,
            scale: None,
            occluded: false,
        }],
        markers,
    }
}

/// Frame `n` of a capture sampled at `rate_hz`.
pub fn demo_frame(n: u32, rate_hz: f64) -> FrameSnapshot {
    let t = n as f64 / rate_hz;
    FrameSnapshot {
        frame_number: n,
        subjects: vec![arm_subject(t), wand_subject(t)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_frame_shape() {
        let frame = demo_frame(10, 100.0);
        assert_eq!(frame.frame_number, 10);
        let arm = frame.subject("Arm").unwrap();
        assert_eq!(arm.root().map(|r| r.name.as_str()), Some("Root"));
        assert_eq!(arm.children("Root").count(), 1);
        assert_eq!(frame.subject("Wand").unwrap().markers.len(), 3);
    }
}
