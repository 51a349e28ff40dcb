//! Hits and segments produced by a shot.

use crate::Ray;
use tgc_kernel_math::{Point3, Vec3};

/// Which surface of the TGC a hit lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTag {
    /// The lateral (conical) surface.
    Body,
    /// The end cap at `V + H`.
    Top,
    /// The end cap at `V`.
    Bottom,
}

/// A single ray/surface crossing.
///
/// Attributes (normal, UV, curvature) are computed on demand from the
/// cached standard-space point; the ray never has to be transformed again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Signed distance along the ray in world units.
    pub dist: f64,
    /// Surface that was crossed.
    pub surface: SurfaceTag,
    /// Hit point in the solid's standard space.
    pub std_point: Vec3,
}

impl Hit {
    /// World-space hit point on the ray that produced this hit.
    pub fn point(&self, ray: &Ray) -> Point3 {
        ray.at(self.dist)
    }
}

/// An (entry, exit) pair along a ray, with `in_hit.dist <= out_hit.dist`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Where the ray enters the solid.
    pub in_hit: Hit,
    /// Where the ray leaves the solid.
    pub out_hit: Hit,
}

impl Segment {
    /// Length of the segment in world units.
    pub fn length(&self) -> f64 {
        self.out_hit.dist - self.in_hit.dist
    }
}
