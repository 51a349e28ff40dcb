//! Analytic measures of a TGC.
//!
//! Every cross section parallel to the base is an ellipse centered on the
//! axis whose semi-axes interpolate linearly from `|A|, |B|` to `|C|, |D|`.
//! Volume and centroid integrate that in closed form; the lateral area has
//! no closed form for the general case and is integrated numerically.

use crate::TgcDef;
use std::f64::consts::PI;
use tgc_kernel_math::{Point3, Vec3};

/// Gauss-Legendre nodes on [-1, 1].
const GL_NODES: [f64; 5] = [
    0.0,
    -0.538_469_310_105_683_1,
    0.538_469_310_105_683_1,
    -0.906_179_845_938_664,
    0.906_179_845_938_664,
];

const GL_WEIGHTS: [f64; 5] = [
    0.568_888_888_888_888_9,
    0.478_628_670_499_366_47,
    0.478_628_670_499_366_47,
    0.236_926_885_056_189_08,
    0.236_926_885_056_189_08,
];

const Z_PANELS: usize = 4;
const THETA_SAMPLES: usize = 256;

impl TgcDef {
    /// Area of the base ellipse.
    pub fn base_area(&self) -> f64 {
        PI * self.a.norm() * self.b.norm()
    }

    /// Area of the top ellipse.
    pub fn top_area(&self) -> f64 {
        PI * self.c.norm() * self.d.norm()
    }

    /// Enclosed volume.
    pub fn volume(&self) -> f64 {
        let (p0, p1, p2) = self.section_poly();
        PI * self.perp_height() * (p0 + p1 / 2.0 + p2 / 3.0)
    }

    /// Center of mass, assuming uniform density.
    ///
    /// Cross sections are centered on the axis, so the centroid lies on
    /// `V + t H` for the area-weighted mean `t`.
    pub fn centroid(&self) -> Point3 {
        let (p0, p1, p2) = self.section_poly();
        let denom = p0 + p1 / 2.0 + p2 / 3.0;
        if denom <= 0.0 {
            return self.v + self.h * 0.5;
        }
        let t = (p0 / 2.0 + p1 / 3.0 + p2 / 4.0) / denom;
        self.v + self.h * t
    }

    /// Total surface area: both end caps plus the lateral surface.
    pub fn surface_area(&self) -> f64 {
        self.base_area() + self.top_area() + self.lateral_area()
    }

    /// Area of the lateral (ruled) surface.
    pub fn lateral_area(&self) -> f64 {
        let (ua, ub) = self.axis_dirs();
        let (ma, mb, mc, md) = (self.a.norm(), self.b.norm(), self.c.norm(), self.d.norm());

        // |dP/dtheta x dP/dz| at (theta, z)
        let integrand = |theta: f64, z: f64| -> f64 {
            let (s, c) = theta.sin_cos();
            let ra = ma + (mc - ma) * z;
            let rb = mb + (md - mb) * z;
            let d_theta = ua * (-ra * s) + ub * (rb * c);
            let d_z = self.h + ua * ((mc - ma) * c) + ub * ((md - mb) * s);
            d_theta.cross(&d_z).norm()
        };

        let dtheta = 2.0 * PI / THETA_SAMPLES as f64;
        let ring = |z: f64| -> f64 {
            (0..THETA_SAMPLES)
                .map(|i| integrand(i as f64 * dtheta, z))
                .sum::<f64>()
                * dtheta
        };

        let panel = 1.0 / Z_PANELS as f64;
        let mut area = 0.0;
        for k in 0..Z_PANELS {
            let mid = (k as f64 + 0.5) * panel;
            for (x, w) in GL_NODES.iter().zip(GL_WEIGHTS.iter()) {
                area += w * ring(mid + x * panel / 2.0) * panel / 2.0;
            }
        }
        area
    }

    /// Coefficients of `a(t) b(t) = p0 + p1 t + p2 t^2` along the axis.
    fn section_poly(&self) -> (f64, f64, f64) {
        let (a, b, c, d) = (self.a.norm(), self.b.norm(), self.c.norm(), self.d.norm());
        (a * b, a * (d - b) + b * (c - a), (c - a) * (d - b))
    }

    /// Height measured perpendicular to the end planes.
    fn perp_height(&self) -> f64 {
        let n = self.a.cross(&self.b);
        let n = if n.norm() > 0.0 { n } else { self.c.cross(&self.d) };
        let len = n.norm();
        if len > 0.0 {
            self.h.dot(&(n / len)).abs()
        } else {
            0.0
        }
    }

    /// Unit directions of the first and second ellipse axes.
    fn axis_dirs(&self) -> (Vec3, Vec3) {
        let pick = |p: &Vec3, q: &Vec3, fallback: Vec3| {
            if p.norm() > 0.0 {
                p.normalize()
            } else if q.norm() > 0.0 {
                q.normalize()
            } else {
                fallback
            }
        };
        (pick(&self.a, &self.c, Vec3::x()), pick(&self.b, &self.d, Vec3::y()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cylinder_measures() {
        let t = TgcDef::rcc(Point3::origin(), Vec3::new(0.0, 0.0, 2.0), 1.0);
        assert_relative_eq!(t.volume(), 2.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(t.surface_area(), 6.0 * PI, epsilon = 1e-9);
        let c = t.centroid();
        assert_relative_eq!(c.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cone_measures() {
        // unit cone with a point top
        let t = TgcDef::trc(Point3::origin(), Vec3::new(0.0, 0.0, 1.0), 1.0, 0.0);
        assert_relative_eq!(t.volume(), PI / 3.0, epsilon = 1e-12);
        assert_relative_eq!(t.lateral_area(), PI * 2f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(t.centroid().z, 0.25, epsilon = 1e-12);
        assert_eq!(t.top_area(), 0.0);
    }

    #[test]
    fn test_frustum_volume() {
        // V = pi h / 3 (R^2 + R r + r^2)
        let t = TgcDef::trc(Point3::origin(), Vec3::new(0.0, 0.0, 10.0), 2.0, 1.0);
        assert_relative_eq!(t.volume(), PI * 10.0 / 3.0 * 7.0, epsilon = 1e-10);
    }

    #[test]
    fn test_oblique_volume_uses_perpendicular_height() {
        let mut t = TgcDef::rcc(Point3::origin(), Vec3::new(0.0, 0.0, 3.0), 1.0);
        t.h = Vec3::new(2.0, 0.0, 3.0);
        assert_relative_eq!(t.volume(), 3.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(t.centroid().x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_elliptic_cylinder_lateral_area() {
        // circumference of a 3x1 ellipse is about 13.3649
        let t = TgcDef::rec(
            Point3::origin(),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(t.lateral_area(), 13.364_89, epsilon = 1e-4);
    }
}
