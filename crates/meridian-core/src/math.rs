//! Immutable 3D vector math
//!
//! Every spatial computation in Meridian goes through [`Vector3`]. The type is
//! `Copy` and has no in-place operators, so arithmetic always yields a new
//! value and never touches its operands.

use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 3-component vector in world space (X east, Y north, Z up).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const ONE: Vector3 = Vector3::new(1.0, 1.0, 1.0);
    pub const X: Vector3 = Vector3::new(1.0, 0.0, 0.0);
    pub const Y: Vector3 = Vector3::new(0.0, 1.0, 0.0);
    pub const Z: Vector3 = Vector3::new(0.0, 0.0, 1.0);

    /// Create a vector from components
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a vector with all components set to `v`
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    /// Dot product. Commutative.
    pub fn dot(self, other: Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product: `a.cross(b) == -b.cross(a)`.
    pub fn cross(self, other: Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared magnitude
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Magnitude
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector normalizes to the zero vector rather than NaN.
    pub fn normalize(self) -> Vector3 {
        let length = self.length();
        if length == 0.0 {
            Vector3::ZERO
        } else {
            self / length
        }
    }

    /// Euclidean distance to another point
    pub fn distance_to(self, other: Vector3) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance to another point
    pub fn distance_squared(self, other: Vector3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Interpret each component as degrees and convert it to radians
    pub fn to_radians(self) -> Vector3 {
        self * (PI / 180.0)
    }

    /// Whether all components are finite (not NaN or infinity)
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Components as an array
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

// ---- Operators ----

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Add<f64> for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x + rhs, self.y + rhs, self.z + rhs)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub<f64> for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x - rhs, self.y - rhs, self.z - rhs)
    }
}

impl Mul for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div for Vector3 {
    type Output = Vector3;

    fn div(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;

    fn div(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

// ---- Conversions ----

/// Hosts hand coordinates back as plain number triples.
impl From<[f64; 3]> for Vector3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Vector3::new(x, y, z)
    }
}

impl From<(f64, f64, f64)> for Vector3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Vector3::new(x, y, z)
    }
}

impl From<glam::DVec3> for Vector3 {
    fn from(v: glam::DVec3) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for glam::DVec3 {
    fn from(v: Vector3) -> Self {
        glam::DVec3::new(v.x, v.y, v.z)
    }
}

impl From<glam::Vec3> for Vector3 {
    fn from(v: glam::Vec3) -> Self {
        Vector3::new(v.x as f64, v.y as f64, v.z as f64)
    }
}

impl From<Vector3> for glam::Vec3 {
    fn from(v: Vector3) -> Self {
        glam::Vec3::new(v.x as f32, v.y as f32, v.z as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: Vector3, b: Vector3) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS && (a.z - b.z).abs() < EPS
    }

    fn samples() -> Vec<Vector3> {
        vec![
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-4.5, 0.25, 9.0),
            Vector3::new(1e3, -2e-3, 0.0),
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::ZERO,
        ]
    }

    #[test]
    fn add_then_sub_restores_operand() {
        for a in samples() {
            for b in samples() {
                assert!(approx((a + b) - b, a), "a={a} b={b}");
            }
        }
    }

    #[test]
    fn operators_do_not_mutate() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 5.0, 6.0);
        let _ = a + b;
        let _ = a * 2.0;
        assert_eq!(a, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(b, Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn scalar_broadcast() {
        let v = Vector3::new(1.0, 2.0, 4.0);
        assert_eq!(v + 1.0, Vector3::new(2.0, 3.0, 5.0));
        assert_eq!(v - 1.0, Vector3::new(0.0, 1.0, 3.0));
        assert_eq!(v * 2.0, Vector3::new(2.0, 4.0, 8.0));
        assert_eq!(v / 2.0, Vector3::new(0.5, 1.0, 2.0));
        assert_eq!(
            v * Vector3::new(2.0, 0.5, 0.25),
            Vector3::ONE * 2.0 - Vector3::new(0.0, 1.0, 1.0)
        );
    }

    #[test]
    fn normalize_zero_is_zero() {
        let n = Vector3::ZERO.normalize();
        assert_eq!(n, Vector3::ZERO);
        assert!(n.is_finite());
    }

    #[test]
    fn normalize_nonzero_is_unit_length() {
        for v in samples().into_iter().filter(|v| v.length() > 0.0) {
            assert!((v.normalize().length() - 1.0).abs() < EPS, "v={v}");
        }
    }

    #[test]
    fn cross_is_anticommutative_and_right_handed() {
        for a in samples() {
            for b in samples() {
                assert!(approx(a.cross(b), -b.cross(a)));
            }
        }
        assert_eq!(Vector3::X.cross(Vector3::Y), Vector3::Z);
        assert_eq!(Vector3::Y.cross(Vector3::Z), Vector3::X);
    }

    #[test]
    fn dot_is_commutative() {
        for a in samples() {
            for b in samples() {
                assert_eq!(a.dot(b), b.dot(a));
            }
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Vector3::new(1.0, -2.0, 3.5);
        let b = Vector3::new(-7.0, 4.0, 0.5);
        assert_eq!(a.distance_to(b), b.distance_to(a));
        assert!((a.distance_to(b) - a.distance_squared(b).sqrt()).abs() < EPS);
        assert!((a.distance_to(b) - (a - b).length()).abs() < EPS);
    }

    #[test]
    fn division_by_zero_follows_ieee() {
        let v = Vector3::new(1.0, -1.0, 0.0) / 0.0;
        assert_eq!(v.x, f64::INFINITY);
        assert_eq!(v.y, f64::NEG_INFINITY);
        assert!(v.z.is_nan());
        assert!(!v.is_finite());
    }

    #[test]
    fn degrees_to_radians() {
        let r = Vector3::new(180.0, 90.0, -45.0).to_radians();
        assert!(approx(r, Vector3::new(PI, PI / 2.0, -PI / 4.0)));
    }

    #[test]
    fn glam_interop() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let d: glam::DVec3 = v.into();
        assert_eq!(Vector3::from(d), v);
        assert_eq!(Vector3::from([1.0, 2.0, 3.0]), v);
    }
}
