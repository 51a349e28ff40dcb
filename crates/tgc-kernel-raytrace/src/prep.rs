//! Prep: validate a TGC definition and build its normalized representation.
//!
//! The normalized ("standard") space maps the base ellipse onto the unit
//! circle in the `z = 0` plane and the top ellipse center onto `(0, 0, 1)`.
//! Three transforms are kept:
//!
//! - `to_standard`: `Scl * Shr * Rot * Translate(-V)`, model points into
//!   standard space.
//! - `from_standard_for_normals`: `Rot^T * Shr^T * Scl`, standard gradients
//!   back into model space. The shear transpose maps normals; its inverse
//!   does not.
//! - `from_standard`: the true inverse of `to_standard`, for points.

use crate::error::{PrepError, Result};
use log::{debug, info};
use tgc_kernel_geom::TgcDef;
use tgc_kernel_math::{reldiff, Aabb3, Dir3, Point3, Tolerance, Transform};

/// Area ratio used when the top axis it divides by is degenerate.
const AREA_RATIO_SENTINEL: f64 = 1.0e30;

/// Ratios closer to zero than this are snapped to zero.
const RATIO_SNAP: f64 = 1.0e-10;

/// Bounding volume of a prepared TGC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Box around the eight end-ellipse corners.
    pub aabb: Aabb3,
    /// Center of the box.
    pub center: Point3,
    /// Largest half-extent of the box.
    pub tight_radius: f64,
    /// Half-diagonal of the box; a sphere that encloses the whole solid.
    pub loose_radius: f64,
}

impl Bounds {
    fn from_def(def: &TgcDef) -> Self {
        let top = def.top_center();
        let mut corners = Vec::with_capacity(8);
        for (sa, sb) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
            corners.push(def.v + def.a * sa + def.b * sb);
            corners.push(top + def.c * sa + def.d * sb);
        }
        let aabb = Aabb3::from_points(&corners);
        let half = aabb.half_extents();
        Self {
            aabb,
            center: aabb.center(),
            tight_radius: half.x.max(half.y).max(half.z),
            loose_radius: half.norm(),
        }
    }
}

/// A validated TGC with everything the shot and attribute code needs.
///
/// Immutable once built, and safe to share across worker threads.
#[derive(Debug, Clone)]
pub struct PreparedTgc {
    def: TgcDef,
    swapped: bool,
    tol: Tolerance,
    sheared_height: f64,
    mag_a: f64,
    mag_b: f64,
    mag_c: f64,
    mag_d: f64,
    c_over_a_m1: f64,
    d_over_b_m1: f64,
    aa_over_cc: f64,
    bb_over_dd: f64,
    top_normal: Dir3,
    to_standard: Transform,
    from_standard_for_normals: Transform,
    from_standard: Transform,
    equal_eccentricities: bool,
    bounds: Bounds,
}

/// Relabel the ends so that only the top may be degenerate (a point or a
/// line); the base needs both axes to build the standard frame.
///
/// Returns the (possibly new) definition and whether the ends were swapped.
/// The input is never modified.
pub fn canonicalize(def: &TgcDef, tol: &Tolerance) -> (TgcDef, bool) {
    let base_degenerate = tol.is_zero(def.a.norm()) || tol.is_zero(def.b.norm());
    if base_degenerate {
        (def.swap_ends(), true)
    } else {
        (*def, false)
    }
}

/// Validate a definition and build its prepared form.
pub fn prep(def: &TgcDef, tol: &Tolerance) -> Result<PreparedTgc> {
    let mag_h = def.h.norm();
    if tol.is_zero(mag_h) {
        return Err(PrepError::ZeroHeight(mag_h));
    }

    let base_degenerate = tol.is_zero(def.a.norm()) || tol.is_zero(def.b.norm());
    let top_degenerate = tol.is_zero(def.c.norm()) || tol.is_zero(def.d.norm());
    if base_degenerate && top_degenerate {
        return Err(PrepError::DegenerateEnds);
    }

    let (def, swapped) = canonicalize(def, tol);
    if swapped {
        info!("tgc: degenerate base ellipse, swapping base and top");
    }

    let mag_a = def.a.norm();
    let mag_b = def.b.norm();
    let mag_c = def.c.norm();
    let mag_d = def.d.norm();
    if tol.is_zero(mag_a) || tol.is_zero(mag_b) {
        return Err(PrepError::DegenerateAxis { a: mag_a, b: mag_b });
    }

    check_axes(&def, tol, mag_a, mag_b, mag_c, mag_d, mag_h)?;

    // Rotation rows: A, B made orthogonal to A, and H minus its A/B parts.
    let ua = def.a / mag_a;
    let ub = (def.b - ua * def.b.dot(&ua)).normalize();
    let uc = (def.h - ua * def.h.dot(&ua) - ub * def.h.dot(&ub)).normalize();
    let top_normal = Dir3::new_unchecked(uc);

    let rot = Transform::from_rows(&ua, &ub, &uc);
    let irot = rot.transpose();

    let nh = rot.apply_vec(&def.h);
    let sheared_height = nh.z;
    let (sx, sy) = (nh.x / nh.z, nh.y / nh.z);
    let shr = Transform::shear_z(-sx, -sy);
    let tshr = shr.transpose();
    let ishr = Transform::shear_z(sx, sy);

    let scl = Transform::scale(1.0 / mag_a, 1.0 / mag_b, 1.0 / sheared_height);
    let iscl = Transform::scale(mag_a, mag_b, sheared_height);

    let to_standard = scl
        .then(&shr)
        .then(&rot)
        .then(&Transform::translation(-def.v.x, -def.v.y, -def.v.z));
    let from_standard_for_normals = irot.then(&tshr).then(&scl);
    let from_standard = Transform::translation(def.v.x, def.v.y, def.v.z)
        .then(&irot)
        .then(&ishr)
        .then(&iscl);

    if !to_standard.matrix.iter().all(|x| x.is_finite())
        || !from_standard.matrix.iter().all(|x| x.is_finite())
    {
        return Err(PrepError::SingularTransform);
    }

    let snap = |x: f64| if x.abs() < RATIO_SNAP { 0.0 } else { x };
    let c_over_a_m1 = snap(mag_c / mag_a - 1.0);
    let d_over_b_m1 = snap(mag_d / mag_b - 1.0);
    let area_ratio = |num: f64, den: f64| {
        if tol.is_zero(den) {
            AREA_RATIO_SENTINEL
        } else {
            (num * num) / (den * den)
        }
    };
    let aa_over_cc = area_ratio(mag_a, mag_c);
    let bb_over_dd = area_ratio(mag_b, mag_d);

    let equal_eccentricities = reldiff(mag_a * mag_d, mag_c * mag_b) < tol.eccentricity;
    let bounds = Bounds::from_def(&def);

    debug!(
        "tgc prepped: |H|={:.6} sheared={:.6} |A|={:.6} |B|={:.6} |C|={:.6} |D|={:.6} equal_ecc={}",
        mag_h, sheared_height, mag_a, mag_b, mag_c, mag_d, equal_eccentricities
    );

    Ok(PreparedTgc {
        def,
        swapped,
        tol: *tol,
        sheared_height,
        mag_a,
        mag_b,
        mag_c,
        mag_d,
        c_over_a_m1,
        d_over_b_m1,
        aa_over_cc,
        bb_over_dd,
        top_normal,
        to_standard,
        from_standard_for_normals,
        from_standard,
        equal_eccentricities,
        bounds,
    })
}

/// Coplanarity, perpendicularity and parallelism checks.
fn check_axes(
    def: &TgcDef,
    tol: &Tolerance,
    mag_a: f64,
    mag_b: f64,
    mag_c: f64,
    mag_d: f64,
    mag_h: f64,
) -> Result<()> {
    let coplanar = def.h.dot(&def.a.cross(&def.b)).abs() / (mag_a * mag_b * mag_h);
    if tol.is_perp(coplanar) {
        return Err(PrepError::CoplanarHeight(coplanar));
    }

    let cos_ab = def.a.dot(&def.b) / (mag_a * mag_b);
    if !tol.is_perp(cos_ab) {
        return Err(PrepError::NotPerpendicular {
            end: "base",
            cos: cos_ab,
        });
    }
    if !tol.is_zero(mag_c) && !tol.is_zero(mag_d) {
        let cos_cd = def.c.dot(&def.d) / (mag_c * mag_d);
        if !tol.is_perp(cos_cd) {
            return Err(PrepError::NotPerpendicular {
                end: "top",
                cos: cos_cd,
            });
        }
    }

    if !tol.is_zero(mag_c) {
        let sin = def.a.cross(&def.c).norm() / (mag_a * mag_c);
        if !tol.is_perp(sin) {
            return Err(PrepError::NotParallel {
                pair: "A and C",
                sin,
            });
        }
    }
    if !tol.is_zero(mag_d) {
        let sin = def.b.cross(&def.d).norm() / (mag_b * mag_d);
        if !tol.is_perp(sin) {
            return Err(PrepError::NotParallel {
                pair: "B and D",
                sin,
            });
        }
    }
    Ok(())
}

impl PreparedTgc {
    /// The (canonical) definition that was prepared.
    pub fn def(&self) -> &TgcDef {
        &self.def
    }

    /// Whether prep swapped the ends of the input definition.
    pub fn swapped(&self) -> bool {
        self.swapped
    }

    /// Tolerances used at prep and shot time.
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    /// Center of the base ellipse.
    pub fn base(&self) -> Point3 {
        self.def.v
    }

    /// Height of the solid measured along `top_normal`.
    pub fn sheared_height(&self) -> f64 {
        self.sheared_height
    }

    /// Magnitudes of A, B, C and D.
    pub fn mags(&self) -> [f64; 4] {
        [self.mag_a, self.mag_b, self.mag_c, self.mag_d]
    }

    /// `|C| / |A| - 1`: slope of the standard-space radius along X.
    pub fn c_over_a_minus_1(&self) -> f64 {
        self.c_over_a_m1
    }

    /// `|D| / |B| - 1`: slope of the standard-space radius along Y.
    pub fn d_over_b_minus_1(&self) -> f64 {
        self.d_over_b_m1
    }

    /// `|A|^2 / |C|^2`, or a large sentinel when C is degenerate.
    pub fn aa_over_cc(&self) -> f64 {
        self.aa_over_cc
    }

    /// `|B|^2 / |D|^2`, or a large sentinel when D is degenerate.
    pub fn bb_over_dd(&self) -> f64 {
        self.bb_over_dd
    }

    /// Outward unit normal of the top cap.
    pub fn top_normal(&self) -> Dir3 {
        self.top_normal
    }

    /// Model space to standard space.
    pub fn to_standard(&self) -> &Transform {
        &self.to_standard
    }

    /// Standard-space gradients to model-space normals (linear).
    pub fn from_standard_for_normals(&self) -> &Transform {
        &self.from_standard_for_normals
    }

    /// Standard space back to model space.
    pub fn from_standard(&self) -> &Transform {
        &self.from_standard
    }

    /// True when `|A||D| ~ |C||B|`; rays are then solved as a quadratic.
    pub fn equal_eccentricities(&self) -> bool {
        self.equal_eccentricities
    }

    /// Bounding box and spheres.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// True when the top ellipse collapses to a point or a line.
    pub fn top_degenerate(&self) -> bool {
        self.tol.is_zero(self.mag_c) || self.tol.is_zero(self.mag_d)
    }

    /// Standard-space radius functions `R(z)` and `Q(z)` along X and Y.
    #[inline]
    pub(crate) fn radii(&self, z: f64) -> (f64, f64) {
        (1.0 + self.c_over_a_m1 * z, 1.0 + self.d_over_b_m1 * z)
    }
}
