//! Coordinate-frame conversion from stream space to scene space.
//!
//! The stream is right-handed, Z-up, millimeters. The scene convention is a
//! deployment choice, so the conversion is a signed axis permutation held as
//! data rather than hard-coded. Each target axis is written as a source axis
//! with an optional sign, e.g. `["-y", "z", "x"]` means
//!
//! ```text
//! target.x = -source.y
//! target.y =  source.z
//! target.z =  source.x
//! ```
//!
//! Rotations use the same map on the quaternion vector part, multiplied by the
//! determinant of the map. A map with determinant -1 flips handedness, and the
//! rotation axis is a pseudovector, so its sign flips with it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{Quaternion, Vec3};

/// Millimeters to meters.
pub const MM_TO_M: f64 = 0.001;

/// Signed permutation of the three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 3]", into = "[String; 3]")]
pub struct AxisMap {
    /// Source axis index feeding each target axis.
    source: [usize; 3],
    /// Whether each target axis negates its source.
    negate: [bool; 3],
}

impl AxisMap {
    /// Identity map: no axis change.
    pub const IDENTITY: AxisMap = AxisMap {
        source: [0, 1, 2],
        negate: [false, false, false],
    };

    /// Right-handed Z-up to left-handed Y-up: `(-y, z, x)`.
    pub const Z_UP_TO_Y_UP_LEFT: AxisMap = AxisMap {
        source: [1, 2, 0],
        negate: [true, false, false],
    };

    /// Build a map from per-target-axis specs such as `"-y"` or `"x"`.
    pub fn parse(spec: [&str; 3]) -> Result<Self, AxisMapError> {
        let mut source = [0usize; 3];
        let mut negate = [false; 3];
        for (i, term) in spec.iter().enumerate() {
            let term = term.trim();
            let (neg, axis) = match term.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, term.strip_prefix('+').unwrap_or(term)),
            };
            source[i] = match axis {
                "x" | "X" => 0,
                "y" | "Y" => 1,
                "z" | "Z" => 2,
                _ => return Err(AxisMapError::UnknownAxis(term.to_string())),
            };
            negate[i] = neg;
        }
        let mut seen = [false; 3];
        for &s in &source {
            if seen[s] {
                return Err(AxisMapError::NotAPermutation);
            }
            seen[s] = true;
        }
        Ok(Self { source, negate })
    }

    /// Determinant of the map: +1 preserves handedness, -1 mirrors.
    pub fn determinant(&self) -> f64 {
        // Parity of the permutation: count inversions.
        let mut inversions = 0;
        for i in 0..3 {
            for j in (i + 1)..3 {
                if self.source[i] > self.source[j] {
                    inversions += 1;
                }
            }
        }
        let mut det = if inversions % 2 == 0 { 1.0 } else { -1.0 };
        for &n in &self.negate {
            if n {
                det = -det;
            }
        }
        det
    }

    /// Map a direction or position from stream axes to scene axes.
    #[inline]
    pub fn convert_vector(&self, v: Vec3) -> Vec3 {
        let c = |i: usize| {
            let value = v.axis(self.source[i]);
            if self.negate[i] { -value } else { value }
        };
        Vec3::new(c(0), c(1), c(2))
    }

    /// Map an orientation from stream axes to scene axes.
    pub fn convert_rotation(&self, q: Quaternion) -> Quaternion {
        let v = self.convert_vector(q.vector()) * self.determinant();
        Quaternion::new(q.w, v.x, v.y, v.z)
    }

    /// Stream millimeters to scene meters, with axis conversion.
    #[inline]
    pub fn convert_position_mm(&self, mm: Vec3) -> Vec3 {
        self.convert_vector(mm * MM_TO_M)
    }
}

impl Default for AxisMap {
    fn default() -> Self {
        Self::Z_UP_TO_Y_UP_LEFT
    }
}

impl fmt::Display for AxisMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c]: [String; 3] = (*self).into();
        write!(f, "({a}, {b}, {c})")
    }
}

impl TryFrom<[String; 3]> for AxisMap {
    type Error = AxisMapError;

    fn try_from(value: [String; 3]) -> Result<Self, Self::Error> {
        AxisMap::parse([value[0].as_str(), value[1].as_str(), value[2].as_str()])
    }
}

impl From<AxisMap> for [String; 3] {
    fn from(map: AxisMap) -> Self {
        const NAMES: [&str; 3] = ["x", "y", "z"];
        let term = |i: usize| {
            let sign = if map.negate[i] { "-" } else { "" };
            format!("{}{}", sign, NAMES[map.source[i]])
        };
        [term(0), term(1), term(2)]
    }
}

/// Invalid axis calibration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AxisMapError {
    #[error("unknown axis '{0}' (expected x, y or z with optional sign)")]
    UnknownAxis(String),
    #[error("axis map must use each of x, y, z exactly once")]
    NotAPermutation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
    }

    #[test]
    fn test_default_position_mapping() {
        let map = AxisMap::default();
        let out = map.convert_vector(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(out, Vec3::new(-2.0, 3.0, 1.0));
        assert_relative_eq!(map.determinant(), -1.0);
    }

    #[test]
    fn test_default_rotation_components() {
        // (x, y, z, w) -> (y, -z, -x, w)
        let q = Quaternion::from_xyzw([0.1, 0.2, 0.3, 0.9]);
        let out = AxisMap::default().convert_rotation(q);
        assert_relative_eq!(out.x, 0.2);
        assert_relative_eq!(out.y, -0.3);
        assert_relative_eq!(out.z, -0.1);
        assert_relative_eq!(out.w, 0.9);
    }

    #[test]
    fn test_ground_truth_quarter_turn() {
        // +90 deg about stream up (z) is -90 deg about scene up (y).
        let map = AxisMap::default();
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let expected = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), -FRAC_PI_2);
        let out = map.convert_rotation(q);
        assert!(out.approx_same_rotation(&expected, 1e-12));
        assert_vec_eq(out.rotate(Vec3::new(0.0, 0.0, 1.0)), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotation_commutes_with_mapping() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.3, -1.0, 0.6), 1.1);
        let v = Vec3::new(0.5, 2.0, -1.5);
        for spec in [["-y", "z", "x"], ["x", "z", "y"], ["-x", "-y", "z"], ["z", "x", "-y"]] {
            let map = AxisMap::parse(spec).unwrap();
            let lhs = map.convert_rotation(q).rotate(map.convert_vector(v));
            let rhs = map.convert_vector(q.rotate(v));
            assert_vec_eq(lhs, rhs);
        }
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(
            AxisMap::parse(["x", "x", "z"]),
            Err(AxisMapError::NotAPermutation)
        );
        assert!(matches!(
            AxisMap::parse(["x", "w", "z"]),
            Err(AxisMapError::UnknownAxis(_))
        ));
    }

    #[test]
    fn test_string_form_round_trip() {
        let map = AxisMap::parse(["-y", "+z", "x"]).unwrap();
        let strings: [String; 3] = map.into();
        assert_eq!(strings, ["-y".to_string(), "z".to_string(), "x".to_string()]);
        assert_eq!(map.to_string(), "(-y, z, x)");
        assert_eq!(AxisMap::IDENTITY.determinant(), 1.0);
    }

    #[test]
    fn test_position_mm_to_m() {
        let p = AxisMap::IDENTITY.convert_position_mm(Vec3::new(1000.0, -250.0, 0.0));
        assert_vec_eq(p, Vec3::new(1.0, -0.25, 0.0));
    }
}
