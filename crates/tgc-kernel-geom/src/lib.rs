#![warn(missing_docs)]

//! Truncated general cone (TGC) definitions for the TGC solver kernel.
//!
//! A [`TgcDef`] is the raw, unvalidated solid definition handed to the
//! solver: a base center `V`, a height vector `H`, the base ellipse
//! semi-axes `A`, `B` and the top ellipse semi-axes `C`, `D`. The top ellipse
//! is centered at `V + H`.
//!
//! This crate also owns the persisted form of a definition (a fixed record of
//! 18 values), the shorthand constructors for the common special cases, and
//! analytic measures (volume, centroid, surface area).

mod measure;

use serde::{Deserialize, Serialize};
use std::fmt;
use tgc_kernel_math::{any_perpendicular, reldiff, Point3, Tolerance, Transform, Vec3};

/// Number of values in a persisted TGC record: V, H, A, B, C, D (3 each).
pub const RECORD_LEN: usize = 18;

// =============================================================================
// Definition
// =============================================================================

/// Raw truncated general cone definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TgcDef {
    /// Center of the base ellipse.
    pub v: Point3,
    /// Height vector from the base center to the top center.
    pub h: Vec3,
    /// First semi-axis of the base ellipse.
    pub a: Vec3,
    /// Second semi-axis of the base ellipse.
    pub b: Vec3,
    /// First semi-axis of the top ellipse (parallel to `a`).
    pub c: Vec3,
    /// Second semi-axis of the top ellipse (parallel to `b`).
    pub d: Vec3,
}

impl TgcDef {
    /// Create a general TGC.
    pub fn new(v: Point3, h: Vec3, a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Self {
        Self { v, h, a, b, c, d }
    }

    /// Right circular cylinder of radius `r` along `h`.
    pub fn rcc(base: Point3, h: Vec3, r: f64) -> Self {
        Self::trc(base, h, r, r)
    }

    /// Right elliptical cylinder with base semi-axes `a` and `b`.
    pub fn rec(base: Point3, h: Vec3, a: Vec3, b: Vec3) -> Self {
        Self::new(base, h, a, b, a, b)
    }

    /// Truncated right circular cone with base radius `r1` and top radius `r2`.
    pub fn trc(base: Point3, h: Vec3, r1: f64, r2: f64) -> Self {
        let ua = any_perpendicular(&h);
        let ub = h.cross(&ua).normalize();
        Self::new(base, h, ua * r1, ub * r1, ua * r2, ub * r2)
    }

    /// Truncated elliptical cone: the top ellipse is the base scaled by `ratio`.
    pub fn tec(base: Point3, h: Vec3, a: Vec3, b: Vec3, ratio: f64) -> Self {
        Self::new(base, h, a, b, a * ratio, b * ratio)
    }

    /// Center of the top ellipse.
    pub fn top_center(&self) -> Point3 {
        self.v + self.h
    }

    /// New definition with base and top exchanged.
    ///
    /// The solid is unchanged: `V` moves to the old top center, `H` is
    /// reversed, and the axis pairs trade places.
    pub fn swap_ends(&self) -> Self {
        Self {
            v: self.v + self.h,
            h: -self.h,
            a: self.c,
            b: self.d,
            c: self.a,
            d: self.b,
        }
    }

    /// Apply a modeling transform: `V` as a point, the five vectors as vectors.
    pub fn transformed(&self, xform: &Transform) -> Self {
        Self {
            v: xform.apply_point(&self.v),
            h: xform.apply_vec(&self.h),
            a: xform.apply_vec(&self.a),
            b: xform.apply_vec(&self.b),
            c: xform.apply_vec(&self.c),
            d: xform.apply_vec(&self.d),
        }
    }

    // =========================================================================
    // Persisted record
    // =========================================================================

    /// Decode a persisted record and place it with the modeling transform.
    pub fn from_record(rec: &[f64; RECORD_LEN], xform: &Transform) -> Self {
        let vec = |i: usize| Vec3::new(rec[i], rec[i + 1], rec[i + 2]);
        let raw = Self {
            v: Point3::new(rec[0], rec[1], rec[2]),
            h: vec(3),
            a: vec(6),
            b: vec(9),
            c: vec(12),
            d: vec(15),
        };
        raw.transformed(xform)
    }

    /// Encode as a persisted record, converting from mm to local units.
    ///
    /// `local2mm` is the size of one local unit in mm and must be positive.
    pub fn to_record(&self, local2mm: f64) -> [f64; RECORD_LEN] {
        let inv = 1.0 / local2mm;
        let mut rec = [0.0; RECORD_LEN];
        let parts = [
            self.v.coords,
            self.h,
            self.a,
            self.b,
            self.c,
            self.d,
        ];
        for (i, p) in parts.iter().enumerate() {
            rec[3 * i] = p.x * inv;
            rec[3 * i + 1] = p.y * inv;
            rec[3 * i + 2] = p.z * inv;
        }
        rec
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Classify the definition into the most specific TGC family.
    pub fn classify(&self, tol: &Tolerance) -> TgcKind {
        let (ma, mb, mc, md) = (self.a.norm(), self.b.norm(), self.c.norm(), self.d.norm());
        let mh = self.h.norm();
        if mh < tol.linear || ma < tol.linear || mb < tol.linear {
            return TgcKind::Tgc;
        }

        let right = tol.is_perp(self.h.dot(&self.a) / (mh * ma))
            && tol.is_perp(self.h.dot(&self.b) / (mh * mb));
        if !right {
            return TgcKind::Tgc;
        }

        let same = |x: f64, y: f64| reldiff(x, y) < tol.eccentricity;
        let base_circular = same(ma, mb);
        let top_circular = same(mc, md);

        if base_circular && top_circular {
            if same(ma, mc) {
                TgcKind::Rcc
            } else {
                TgcKind::Trc
            }
        } else if same(ma, mc) && same(mb, md) {
            TgcKind::Rec
        } else if same(ma * md, mc * mb) {
            TgcKind::Tec
        } else {
            TgcKind::Tgc
        }
    }
}

/// Family of a TGC, from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TgcKind {
    /// Right circular cylinder.
    Rcc,
    /// Right elliptical cylinder.
    Rec,
    /// Truncated right circular cone.
    Trc,
    /// Truncated elliptical cone with similar end ellipses.
    Tec,
    /// General truncated cone.
    Tgc,
}

impl TgcKind {
    /// Short conventional name.
    pub fn name(&self) -> &'static str {
        match self {
            TgcKind::Rcc => "RCC",
            TgcKind::Rec => "REC",
            TgcKind::Trc => "TRC",
            TgcKind::Tec => "TEC",
            TgcKind::Tgc => "TGC",
        }
    }
}

impl fmt::Display for TgcDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.classify(&Tolerance::DEFAULT);
        writeln!(f, "{} (truncated general cone)", kind.name())?;
        let row = |f: &mut fmt::Formatter<'_>, label: &str, p: &Vec3| {
            writeln!(
                f,
                "\t{} ({:.6}, {:.6}, {:.6}) mag={:.6}",
                label,
                p.x,
                p.y,
                p.z,
                p.norm()
            )
        };
        writeln!(f, "\tV ({:.6}, {:.6}, {:.6})", self.v.x, self.v.y, self.v.z)?;
        let top = self.top_center();
        writeln!(f, "\tTop ({:.6}, {:.6}, {:.6})", top.x, top.y, top.z)?;
        row(f, "H", &self.h)?;
        row(f, "A", &self.a)?;
        row(f, "B", &self.b)?;
        row(f, "C", &self.c)?;
        row(f, "D", &self.d)?;
        writeln!(
            f,
            "\tbase area={:.6} top area={:.6}",
            self.base_area(),
            self.top_area()
        )?;
        writeln!(f, "\tvolume={:.6}", self.volume())
    }
}
