#![warn(missing_docs)]

//! Math types for the TGC solver kernel.
//!
//! Thin wrappers around nalgebra providing the domain types used by the
//! solver: points, vectors, directions, 4x4 transforms (including the shear
//! used to normalize a general cone), bounding boxes and tolerance sets.

mod aabb;

pub use aabb::Aabb3;

use nalgebra::{Matrix3, Matrix4, Unit, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A 3x3 matrix (the linear part of a [`Transform`]).
pub type Mat3 = Matrix3<f64>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Linear transform whose rows are `r0`, `r1`, `r2`.
    ///
    /// With orthonormal rows this is the rotation taking `r0`, `r1`, `r2`
    /// onto the X, Y and Z axes.
    pub fn from_rows(r0: &Vec3, r1: &Vec3, r2: &Vec3) -> Self {
        let mut m = Matrix4::identity();
        for (row, r) in [r0, r1, r2].into_iter().enumerate() {
            m[(row, 0)] = r.x;
            m[(row, 1)] = r.y;
            m[(row, 2)] = r.z;
        }
        Self { matrix: m }
    }

    /// Shear along Z: `x' = x + sx * z`, `y' = y + sy * z`, `z' = z`.
    pub fn shear_z(sx: f64, sy: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 2)] = sx;
        m[(1, 2)] = sy;
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale/shear).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Upper-left 3x3 block.
    pub fn linear(&self) -> Mat3 {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Algebraic transpose of the matrix.
    ///
    /// Only meaningful for linear (translation-free) transforms: the
    /// transpose of a shear maps normals, not points.
    pub fn transpose(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// An arbitrary unit vector perpendicular to `v`.
///
/// The smallest component of `v` is zeroed and the other two are swapped
/// with one negated, which is stable for any non-zero input. Returns the X
/// axis for a zero vector.
pub fn any_perpendicular(v: &Vec3) -> Vec3 {
    let abs = v.abs();
    let i = if abs.x <= abs.y && abs.x <= abs.z {
        0
    } else if abs.y <= abs.z {
        1
    } else {
        2
    };
    let j = (i + 1) % 3;
    let k = (i + 2) % 3;
    let mut out = Vec3::zeros();
    out[j] = v[k];
    out[k] = -v[j];
    let n = out.norm();
    if n < f64::MIN_POSITIVE {
        Vec3::x()
    } else {
        out / n
    }
}

/// Relative difference `|a - b| / max(|a|, |b|)`, zero when both are zero.
pub fn reldiff(a: f64, b: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    let d = a.abs().max(b.abs());
    if d == 0.0 {
        0.0
    } else {
        (a - b).abs() / d
    }
}

/// Tolerance set for geometric validation and ray solving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Length tolerance in mm; vectors shorter than this are degenerate.
    pub linear: f64,
    /// Dot-product tolerance for perpendicular/parallel checks (cosine or sine).
    pub perp: f64,
    /// Relative tolerance deciding whether the two end ellipses have equal
    /// eccentricities (`|A||D|` vs `|C||B|`).
    pub eccentricity: f64,
    /// Largest imaginary part for which a polynomial root counts as real.
    pub root_imag: f64,
    /// Standard-space direction components below this are snapped to zero.
    pub coef: f64,
}

impl Tolerance {
    /// Default tolerances.
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        perp: 1e-3,
        eccentricity: 1e-4,
        root_imag: 1e-4,
        coef: 1e-10,
    };

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if a normalized dot product (or cross magnitude) is effectively zero.
    pub fn is_perp(&self, cos: f64) -> bool {
        cos.abs() < self.perp
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
