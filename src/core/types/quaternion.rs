//! Unit quaternion for 3D orientation.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Quaternion representation [w, x, y, z].
///
/// The stream reports rotations as `[x, y, z, w]`; use
/// [`Quaternion::from_xyzw`] to build one from that layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    #[inline]
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Create identity quaternion (no rotation).
    #[inline]
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Build from the stream's `[x, y, z, w]` layout.
    #[inline]
    pub fn from_xyzw(q: [f64; 4]) -> Self {
        Self::new(q[3], q[0], q[1], q[2])
    }

    #[inline]
    pub fn to_xyzw(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Rotation of `angle` radians about `axis` (need not be normalized).
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let len = axis.length();
        if len < 1e-12 {
            return Self::identity();
        }
        let (s, c) = (angle * 0.5).sin_cos();
        let a = axis * (s / len);
        Self::new(c, a.x, a.y, a.z)
    }

    #[inline]
    pub fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalize the quaternion to unit length.
    pub fn normalized(&self) -> Self {
        let n = self.norm();
        if n > 1e-10 {
            Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
        } else {
            Self::identity()
        }
    }

    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Inverse rotation. Equal to the conjugate for unit quaternions.
    pub fn inverse(&self) -> Self {
        let n2 = self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z;
        if n2 < 1e-20 {
            return Self::identity();
        }
        let c = self.conjugate();
        Self::new(c.w / n2, c.x / n2, c.y / n2, c.z / n2)
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q × v) + 2 q × (q × v)
        let q = self.vector();
        let t = q.cross(&v) * 2.0;
        v + t * self.w + q.cross(&t)
    }

    /// True if both represent the same rotation within `eps` (q and -q are equal).
    pub fn approx_same_rotation(&self, other: &Quaternion, eps: f64) -> bool {
        let dot = self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z;
        (dot.abs() - 1.0).abs() < eps
    }
}

/// Hamilton product: `a * b` applies `b` first, then `a`.
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, b: Quaternion) -> Quaternion {
        let a = self;
        Quaternion::new(
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        )
    }
}
