//! Minimal vector and quaternion math for primitive transforms.
//!
//! Quaternions use the Hamilton convention: `a * b` applies `b` first, then
//! `a`. In the document, vectors are `[x, y, z]` arrays and quaternions
//! `[x, y, z, w]` arrays.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Three-component vector (region meters for positions).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Component-wise comparison within `epsilon`.
    pub fn approx_eq(self, other: Vec3, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Unit quaternion describing a rotation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around `axis` (need not be normalized).
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len = axis.length();
        if len == 0.0 {
            return Quat::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        let k = s / len;
        Quat::new(axis.x * k, axis.y * k, axis.z * k, c)
    }

    pub fn conjugate(self) -> Quat {
        Quat::new(-self.x, -self.y, -self.z, self.w)
    }

    fn norm_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Whether this is a unit quaternion, within `f32` rounding.
    pub fn is_normalized(self) -> bool {
        (self.norm_squared() - 1.0).abs() <= 1e-5
    }

    /// Scale to unit length. A zero or non-finite quaternion becomes the
    /// identity.
    pub fn normalize(self) -> Quat {
        let len = self.norm_squared().sqrt();
        if len == 0.0 || !len.is_finite() {
            return Quat::IDENTITY;
        }
        Quat::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Compare two rotations within `epsilon`; `q` and `-q` are equal.
    pub fn approx_eq(self, other: Quat, epsilon: f32) -> bool {
        let same = (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
            && (self.w - other.w).abs() <= epsilon;
        let flipped = (self.x + other.x).abs() <= epsilon
            && (self.y + other.y).abs() <= epsilon
            && (self.z + other.z).abs() <= epsilon
            && (self.w + other.w).abs() <= epsilon;
        same || flipped
    }
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

/// Rotations read from text are normalized; unit values pass through
/// unchanged so written transforms read back bit-exact.
impl From<[f32; 4]> for Quat {
    fn from(v: [f32; 4]) -> Self {
        let q = Quat::new(v[0], v[1], v[2], v[3]);
        if q.is_normalized() {
            q
        } else {
            q.normalize()
        }
    }
}

impl From<Quat> for [f32; 4] {
    fn from(q: Quat) -> Self {
        [q.x, q.y, q.z, q.w]
    }
}

impl Mul for Quat {
    type Output = Quat;

    fn mul(self, rhs: Quat) -> Quat {
        Quat::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

/// Linear RGBA color, each channel in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub const WHITE: Color4 = Color4::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color4 {
    fn default() -> Self {
        Color4::WHITE
    }
}

impl From<[f32; 4]> for Color4 {
    fn from(v: [f32; 4]) -> Self {
        Color4::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Color4> for [f32; 4] {
    fn from(c: Color4) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use proptest::prelude::*;

    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn identity_rotation_is_noop() {
        let v = Vec3::new(1.0, -2.0, 3.5);
        assert!(Quat::IDENTITY.rotate(v).approx_eq(v, EPS));
    }

    #[test]
    fn quarter_turn_about_z() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let rotated = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(rotated.approx_eq(Vec3::new(0.0, 1.0, 0.0), EPS));
    }

    #[test]
    fn composition_applies_right_operand_first() {
        let about_z = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let about_x = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), FRAC_PI_2);
        let v = Vec3::new(0.0, 1.0, 0.0);
        let composed = (about_z * about_x).rotate(v);
        let stepwise = about_z.rotate(about_x.rotate(v));
        assert!(composed.approx_eq(stepwise, EPS));
    }

    #[test]
    fn conjugate_inverts_unit_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 0.7);
        let v = Vec3::new(4.0, 5.0, 6.0);
        assert!(q.conjugate().rotate(q.rotate(v)).approx_eq(v, 1e-4));
        assert!((q * q.conjugate()).approx_eq(Quat::IDENTITY, EPS));
    }

    #[test]
    fn approx_eq_treats_negated_quaternion_as_equal() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 1.0);
        let neg = Quat::new(-q.x, -q.y, -q.z, -q.w);
        assert!(q.approx_eq(neg, EPS));
    }

    #[test]
    fn zero_axis_yields_identity() {
        assert_eq!(Quat::from_axis_angle(Vec3::ZERO, 1.0), Quat::IDENTITY);
        assert_eq!(Quat::new(0.0, 0.0, 0.0, 0.0).normalize(), Quat::IDENTITY);
    }

    #[test]
    fn scaled_rotation_is_normalized_on_read() {
        let quarter = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let doubled = [quarter.x * 2.0, quarter.y * 2.0, quarter.z * 2.0, quarter.w * 2.0];
        let q = Quat::from(doubled);
        assert!(q.is_normalized());
        assert!(q.approx_eq(quarter, EPS));
        let offset = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!((offset.length() - 1.0).abs() < EPS);

        let parsed: Quat = serde_json::from_str("[0.0,0.0,0.0,0.0]").unwrap();
        assert_eq!(parsed, Quat::IDENTITY);
        assert_eq!(Quat::from([f32::NAN, 0.0, 0.0, 1.0]), Quat::IDENTITY);
    }

    #[test]
    fn unit_rotation_reads_back_unchanged() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 0.7);
        let text = serde_json::to_string(&q).unwrap();
        assert_eq!(serde_json::from_str::<Quat>(&text).unwrap(), q);
    }

    #[test]
    fn vectors_serialize_as_arrays() {
        let json = serde_json::to_string(&Vec3::new(1.0, 2.5, -3.0)).unwrap();
        assert_eq!(json, "[1.0,2.5,-3.0]");
        let q: Quat = serde_json::from_str("[0.0,0.0,0.0,1.0]").unwrap();
        assert_eq!(q, Quat::IDENTITY);
    }

    proptest! {
        #[test]
        fn rotation_preserves_length_and_inverts(
            (x, y, z) in (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0),
            (ax, ay, az) in (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0),
            angle in -6.0f32..6.0,
        ) {
            let v = Vec3::new(x, y, z);
            let q = Quat::from_axis_angle(Vec3::new(ax, ay, az), angle);
            let tolerance = 1e-3 * (1.0 + v.length());
            prop_assert!((q.rotate(v).length() - v.length()).abs() <= tolerance);
            prop_assert!(q.conjugate().rotate(q.rotate(v)).approx_eq(v, tolerance));
        }
    }
}
