//! Small fixed-size float vectors used by the model container.
//!
//! Only the operations the codecs need are provided: component access,
//! subtraction, cross product, normalization and reflection across a
//! coordinate axis.

use std::ops::{Div, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D vector with f32 components, used for texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vector2f {
    pub x: f32,
    pub y: f32,
}

/// A 3D vector with f32 components, used for positions and normals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Vector2f {
    /// Creates a new 2D float vector
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Checks if all components are finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Vector3f {
    /// Creates a new 3D float vector
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Computes the dot product of two vectors
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Computes the cross product of two vectors
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Computes the squared length of the vector
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Computes the length of the vector
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns a normalized version of the vector.
    ///
    /// A zero-length vector stays the zero vector.
    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self / len
        } else {
            Self::default()
        }
    }

    /// Returns the vector with the component selected by `axis` negated.
    #[inline]
    pub fn mirrored(self, axis: Axis) -> Self {
        match axis {
            Axis::X => Self::new(-self.x, self.y, self.z),
            Axis::Y => Self::new(self.x, -self.y, self.z),
            Axis::Z => Self::new(self.x, self.y, -self.z),
        }
    }

    /// Checks if all components are finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Surface normal of the triangle `p1 p2 p3`, following the right-hand rule.
    ///
    /// See <https://www.khronos.org/opengl/wiki/Calculating_a_Surface_Normal>.
    /// Degenerate triangles yield the zero vector.
    pub fn face_normal(p1: Self, p2: Self, p3: Self) -> Self {
        let u = p2 - p1;
        let v = p3 - p1;
        u.cross(v).normalized()
    }
}

impl Sub for Vector3f {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Div<f32> for Vector3f {
    type Output = Self;
    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl From<[f32; 2]> for Vector2f {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector3f_operations() {
        let a = Vector3f::new(1.0, 2.0, 3.0);
        let b = Vector3f::new(4.0, 6.0, 8.0);

        assert_eq!(b - a, Vector3f::new(3.0, 4.0, 5.0));
        assert_eq!(b / 2.0, Vector3f::new(2.0, 3.0, 4.0));
        assert_eq!(a.dot(b), 40.0);
    }

    #[test]
    fn test_cross_follows_right_hand_rule() {
        let x = Vector3f::new(1.0, 0.0, 0.0);
        let y = Vector3f::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(x), Vector3f::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_normalized() {
        let v = Vector3f::new(0.0, 3.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert_eq!(v, Vector3f::new(0.0, 0.6, 0.8));
        assert_eq!(Vector3f::default().normalized(), Vector3f::default());
    }

    #[test]
    fn test_mirrored() {
        let v = Vector3f::new(1.0, 2.0, 3.0);
        assert_eq!(v.mirrored(Axis::X), Vector3f::new(-1.0, 2.0, 3.0));
        assert_eq!(v.mirrored(Axis::Y), Vector3f::new(1.0, -2.0, 3.0));
        assert_eq!(v.mirrored(Axis::Z), Vector3f::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn test_face_normal() {
        let n = Vector3f::face_normal(
            Vector3f::new(0.0, 0.0, 0.0),
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(1.0, 1.0, 0.0),
        );
        assert_eq!(n, Vector3f::new(0.0, 0.0, 1.0));

        // Collinear points
        let n = Vector3f::face_normal(
            Vector3f::new(0.0, 0.0, 0.0),
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(2.0, 0.0, 0.0),
        );
        assert_eq!(n, Vector3f::default());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn component() -> impl Strategy<Value = f32> {
            -1.0e3f32..1.0e3
        }

        fn vector() -> impl Strategy<Value = Vector3f> {
            (component(), component(), component()).prop_map(|(x, y, z)| Vector3f::new(x, y, z))
        }

        proptest! {
            #[test]
            fn mirroring_twice_is_identity(v in vector()) {
                for axis in [Axis::X, Axis::Y, Axis::Z] {
                    prop_assert_eq!(v.mirrored(axis).mirrored(axis), v);
                }
            }

            #[test]
            fn face_normal_is_unit_or_zero(a in vector(), b in vector(), c in vector()) {
                let n = Vector3f::face_normal(a, b, c);
                let len = n.length();
                prop_assert!(n == Vector3f::default() || (len - 1.0).abs() < 1e-3, "length {}", len);
            }
        }
    }
}
