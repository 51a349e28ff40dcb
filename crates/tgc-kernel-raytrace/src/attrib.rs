//! Surface attributes at a hit: normal, UV and principal curvature.
//!
//! All three work from the standard-space point cached in the [`Hit`].
//! Lateral normals come from the gradient of the implicit surface
//! `F = Q^2 X^2 + R^2 Y^2 - R^2 Q^2`, mapped back with the transpose of the
//! normalizing transform.

use crate::hit::{Hit, SurfaceTag};
use crate::prep::PreparedTgc;
use nalgebra::{Matrix2, SymmetricEigen};
use std::f64::consts::PI;
use tgc_kernel_math::{any_perpendicular, Dir3, Mat3, Point2, Vec3};

/// Principal curvature at a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curvature {
    /// Unit direction of the first principal curvature.
    pub pdir: Vec3,
    /// Minimum curvature. Negative on surfaces that curve away from the normal.
    pub c1: f64,
    /// Maximum curvature.
    pub c2: f64,
}

/// Outward unit normal at a hit.
pub fn normal(tgc: &PreparedTgc, hit: &Hit) -> Dir3 {
    match hit.surface {
        SurfaceTag::Top => tgc.top_normal(),
        SurfaceTag::Bottom => -tgc.top_normal(),
        SurfaceTag::Body => {
            let g = tgc
                .from_standard_for_normals()
                .apply_vec(&body_gradient(tgc, &hit.std_point));
            // the gradient vanishes only at an apex
            Dir3::try_new(g, f64::EPSILON).unwrap_or_else(|| tgc.top_normal())
        }
    }
}

/// Surface parameters at a hit, `u` around the axis in `[0, 1)`.
///
/// On the body `v` runs from 0 at the base to 1 at the top. On the caps `v`
/// is radial: 0 at the rim and 1 at the center of the bottom, and the
/// reverse on the top.
pub fn uv(tgc: &PreparedTgc, hit: &Hit) -> Point2 {
    let p = &hit.std_point;
    match hit.surface {
        SurfaceTag::Body => {
            let (r, q) = tgc.radii(p.z);
            let xn = if r.abs() > f64::EPSILON { p.x / r } else { p.x };
            let yn = if q.abs() > f64::EPSILON { p.y / q } else { p.y };
            Point2::new(angle_param(xn, yn), p.z)
        }
        SurfaceTag::Top => {
            let xn = p.x * tgc.aa_over_cc().sqrt();
            let yn = p.y * tgc.bb_over_dd().sqrt();
            Point2::new(angle_param(xn, yn), (xn * xn + yn * yn).sqrt())
        }
        SurfaceTag::Bottom => {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            Point2::new(angle_param(p.x, p.y), 1.0 - r)
        }
    }
}

/// `atan2`-style angle of `(x, y)` scaled to `[0, 1)`.
fn angle_param(x: f64, y: f64) -> f64 {
    let len = (x * x + y * y).sqrt();
    if len == 0.0 {
        return 0.0;
    }
    let u = (x / len).clamp(-1.0, 1.0).acos() / (2.0 * PI);
    if y < 0.0 {
        1.0 - u
    } else {
        u
    }
}

/// Principal curvatures and the first principal direction at a hit.
///
/// Caps are flat: both curvatures are zero and the direction is an
/// arbitrary tangent.
pub fn curvature(tgc: &PreparedTgc, hit: &Hit) -> Curvature {
    let n = normal(tgc, hit).into_inner();
    if hit.surface != SurfaceTag::Body {
        return Curvature {
            pdir: any_perpendicular(&n),
            c1: 0.0,
            c2: 0.0,
        };
    }

    let p = &hit.std_point;
    let (r, q) = tgc.radii(p.z);
    let (dr, dq) = (tgc.c_over_a_minus_1(), tgc.d_over_b_minus_1());

    // Hessian of F / 2 in standard space
    let xz = 2.0 * q * dq * p.x;
    let yz = 2.0 * r * dr * p.y;
    let zz = dq * dq * p.x * p.x + dr * dr * p.y * p.y
        - dr * dr * q * q
        - 4.0 * dr * dq * r * q
        - dq * dq * r * r;
    let h_std = Mat3::new(q * q, 0.0, xz, 0.0, r * r, yz, xz, yz, zz);

    let m = tgc.to_standard().linear();
    let mt = tgc.from_standard_for_normals().linear();
    let h_world = mt * h_std * m;
    let grad = mt * body_gradient(tgc, p);
    let glen = grad.norm();
    if glen < f64::EPSILON {
        return Curvature {
            pdir: any_perpendicular(&n),
            c1: 0.0,
            c2: 0.0,
        };
    }

    let u = any_perpendicular(&n);
    let v = n.cross(&u);
    let hu = h_world * u;
    let hv = h_world * v;
    let shape = Matrix2::new(u.dot(&hu), u.dot(&hv), v.dot(&hu), v.dot(&hv)) * (-1.0 / glen);

    let eig = SymmetricEigen::new(shape);
    let (i1, i2) = if eig.eigenvalues[0] <= eig.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let e = eig.eigenvectors.column(i1);
    let pdir = (u * e[0] + v * e[1]).normalize();
    Curvature {
        pdir,
        c1: eig.eigenvalues[i1],
        c2: eig.eigenvalues[i2],
    }
}

/// Half the gradient of `F` at a standard-space point on the body.
fn body_gradient(tgc: &PreparedTgc, p: &Vec3) -> Vec3 {
    let (r, q) = tgc.radii(p.z);
    let (dr, dq) = (tgc.c_over_a_minus_1(), tgc.d_over_b_minus_1());
    Vec3::new(
        q * q * p.x,
        r * r * p.y,
        q * dq * p.x * p.x + r * dr * p.y * p.y - r * q * (dr * q + dq * r),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{prep, shoot, Ray, Resource};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tgc_kernel_geom::TgcDef;
    use tgc_kernel_math::{Point3, Tolerance};

    fn first_hit(tgc: &PreparedTgc, ray: &Ray) -> Hit {
        let mut res = Resource::new();
        shoot(tgc, ray, &mut res)[0].in_hit
    }

    #[test]
    fn test_cap_normals_of_frustum() {
        let def = TgcDef::new(
            Point3::origin(),
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let tgc = prep(&def, &Tolerance::DEFAULT).unwrap();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::z());
        let mut res = Resource::new();
        let seg = shoot(&tgc, &ray, &mut res)[0];
        assert_eq!(normal(&tgc, &seg.in_hit).into_inner(), -Vec3::z());
        assert_eq!(normal(&tgc, &seg.out_hit).into_inner(), Vec3::z());

        // center of each cap
        assert_relative_eq!(uv(&tgc, &seg.in_hit).y, 1.0);
        assert_relative_eq!(uv(&tgc, &seg.out_hit).y, 0.0);
    }

    #[test]
    fn test_cylinder_body_attributes() {
        let def = TgcDef::new(
            Point3::origin(),
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        );
        let tgc = prep(&def, &Tolerance::DEFAULT).unwrap();
        let ray = Ray::new(Point3::new(-10.0, 0.0, 1.0), Vec3::x());
        let hit = first_hit(&tgc, &ray);
        assert_eq!(hit.surface, SurfaceTag::Body);

        let n = normal(&tgc, &hit);
        assert!((n.into_inner() - (-Vec3::x())).norm() < 1e-9);

        // -X is half way around from +A
        let t = uv(&tgc, &hit);
        assert_relative_eq!(t.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(t.y, 0.25, epsilon = 1e-9);

        let c = curvature(&tgc, &hit);
        assert_relative_eq!(c.c1, -0.5, epsilon = 1e-9);
        assert_relative_eq!(c.c2, 0.0, epsilon = 1e-9);
        // the curved direction runs around the axis
        assert!(c.pdir.z.abs() < 1e-9);
        assert!(c.pdir.dot(&n).abs() < 1e-9);
    }

    #[test]
    fn test_cone_curvature() {
        // 45 degree cone: radius 2 at the base, 1 at z = 1
        let def = TgcDef::trc(Point3::origin(), Vec3::new(0.0, 0.0, 1.0), 2.0, 1.0);
        let tgc = prep(&def, &Tolerance::DEFAULT).unwrap();
        let ray = Ray::new(Point3::new(-10.0, 0.0, 0.5), Vec3::x());
        let hit = first_hit(&tgc, &ray);
        assert_eq!(hit.surface, SurfaceTag::Body);

        // normal tilts up by 45 degrees
        let n = normal(&tgc, &hit).into_inner();
        let s = 0.5f64.sqrt();
        assert!((n - Vec3::new(-s, 0.0, s)).norm() < 1e-9);

        // circle radius 1.5; normal curvature around is cos(45) / 1.5
        let c = curvature(&tgc, &hit);
        assert_relative_eq!(c.c1, -s / 1.5, epsilon = 1e-9);
        assert_relative_eq!(c.c2, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cap_curvature_is_flat() {
        let tgc = prep(
            &TgcDef::rcc(Point3::origin(), Vec3::new(0.0, 0.0, 2.0), 1.0),
            &Tolerance::DEFAULT,
        )
        .unwrap();
        let hit = first_hit(&tgc, &Ray::new(Point3::new(0.1, 0.2, -3.0), Vec3::z()));
        assert_eq!(hit.surface, SurfaceTag::Bottom);
        let c = curvature(&tgc, &hit);
        assert_eq!((c.c1, c.c2), (0.0, 0.0));
        assert!(c.pdir.z.abs() < 1e-12);
        assert_relative_eq!(c.pdir.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_random_normals_are_unit_and_outward() {
        let def = TgcDef::new(
            Point3::new(1.0, -2.0, 3.0),
            Vec3::new(2.0, 1.0, 5.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let tgc = prep(&def, &Tolerance::DEFAULT).unwrap();
        let center = def.v + def.h * 0.5;
        let mut rng = StdRng::seed_from_u64(42);
        let mut res = Resource::new();
        let mut body_hits = 0;

        for _ in 0..1000 {
            let dir = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if dir.norm() < 1e-3 {
                continue;
            }
            let aim = center
                + Vec3::new(
                    rng.gen_range(-1.5..1.5),
                    rng.gen_range(-1.5..1.5),
                    rng.gen_range(-2.0..2.0),
                );
            let ray = Ray::new(aim - dir.normalize() * 30.0, dir);
            for seg in shoot(&tgc, &ray, &mut res).to_vec() {
                for (hit, entering) in [(seg.in_hit, true), (seg.out_hit, false)] {
                    let n = normal(&tgc, &hit).into_inner();
                    assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-9);
                    if hit.surface == SurfaceTag::Body {
                        body_hits += 1;
                        // outward: a small step along the normal leaves the solid
                        let p = hit.point(&ray) + n * 1e-4;
                        let s = tgc.to_standard().apply_point(&p);
                        let (r, q) = tgc.radii(s.z);
                        assert!((s.x / r).powi(2) + (s.y / q).powi(2) > 1.0);
                        // and points away from the axis point in the hit's section plane
                        let axis = tgc.base() + tgc.def().h * hit.std_point.z;
                        assert!(n.dot(&(hit.point(&ray) - axis)) >= 0.0);
                    }
                    let d = n.dot(ray.direction.as_ref());
                    if entering {
                        assert!(d <= 1e-9);
                    } else {
                        assert!(d >= -1e-9);
                    }
                    let t = uv(&tgc, &hit);
                    assert!((0.0..1.0).contains(&t.x));
                }
            }
        }
        assert!(body_hits > 100);
    }
}
