//! Exact rational (NURBS) representation of a TGC.
//!
//! The lateral surface is ruled between the two end ellipses, so it is
//! degree 2 around (a nine point rational ellipse) and degree 1 along the
//! ruling. Each cap is a degenerate ruled surface from its center to its rim.
//! Affine maps preserve rational B-splines, so everything is built in
//! standard space and carried back with `from_standard`.

use tgc_kernel_math::{Point3, Transform};
use tgc_kernel_raytrace::PreparedTgc;

// =============================================================================
// Knot vector utilities
// =============================================================================

/// Validate a knot vector: non-decreasing, length = n_control_points + degree + 1.
fn validate_knots(knots: &[f64], n_points: usize, degree: usize) -> bool {
    knots.len() == n_points + degree + 1 && knots.windows(2).all(|w| w[0] <= w[1])
}

/// Find the knot span index for parameter `t`.
///
/// Returns `i` such that `knots[i] <= t < knots[i+1]`, clamped to valid range.
fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Non-zero basis function values `N[span-degree..=span]` at `t`.
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-30 {
                n[j] = saved;
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

// =============================================================================
// Surface
// =============================================================================

/// A weighted control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    /// Position (Cartesian, not premultiplied by the weight).
    pub point: Point3,
    /// Weight (> 0).
    pub weight: f64,
}

impl WeightedPoint {
    /// Create a weighted point.
    pub fn new(point: Point3, weight: f64) -> Self {
        Self { point, weight }
    }

    fn to_homogeneous(self) -> [f64; 4] {
        [
            self.weight * self.point.x,
            self.weight * self.point.y,
            self.weight * self.point.z,
            self.weight,
        ]
    }
}

/// A rational tensor-product NURBS surface.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSurface {
    /// Weighted control points, row-major with `u` varying fastest.
    pub control_points: Vec<WeightedPoint>,
    /// Number of control points in u.
    pub n_u: usize,
    /// Number of control points in v.
    pub n_v: usize,
    /// Knot vector in u.
    pub knots_u: Vec<f64>,
    /// Knot vector in v.
    pub knots_v: Vec<f64>,
    /// Degree in u.
    pub degree_u: usize,
    /// Degree in v.
    pub degree_v: usize,
}

impl NurbsSurface {
    fn new(
        control_points: Vec<WeightedPoint>,
        n_u: usize,
        n_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        degree_u: usize,
        degree_v: usize,
    ) -> Self {
        debug_assert_eq!(control_points.len(), n_u * n_v);
        debug_assert!(validate_knots(&knots_u, n_u, degree_u));
        debug_assert!(validate_knots(&knots_v, n_v, degree_v));
        Self {
            control_points,
            n_u,
            n_v,
            knots_u,
            knots_v,
            degree_u,
            degree_v,
        }
    }

    fn wcp(&self, u_idx: usize, v_idx: usize) -> &WeightedPoint {
        &self.control_points[v_idx * self.n_u + u_idx]
    }

    /// Evaluate at `(u, v)`; parameters are clamped to the domain.
    pub fn eval(&self, u: f64, v: f64) -> Point3 {
        let nu = self.n_u - 1;
        let nv = self.n_v - 1;
        let u = u.clamp(self.knots_u[self.degree_u], self.knots_u[nu + 1]);
        let v = v.clamp(self.knots_v[self.degree_v], self.knots_v[nv + 1]);

        let span_u = find_span(&self.knots_u, nu, self.degree_u, u);
        let span_v = find_span(&self.knots_v, nv, self.degree_v, v);
        let basis_u = basis_functions(&self.knots_u, span_u, self.degree_u, u);
        let basis_v = basis_functions(&self.knots_v, span_v, self.degree_v, v);

        let mut h = [0.0; 4];
        for (j, &bv) in basis_v.iter().enumerate() {
            let v_idx = span_v - self.degree_v + j;
            for (i, &bu) in basis_u.iter().enumerate() {
                let u_idx = span_u - self.degree_u + i;
                let w = bu * bv;
                let cp = self.wcp(u_idx, v_idx).to_homogeneous();
                for k in 0..4 {
                    h[k] += w * cp[k];
                }
            }
        }

        if h[3].abs() < 1e-30 {
            Point3::origin()
        } else {
            Point3::new(h[0] / h[3], h[1] / h[3], h[2] / h[3])
        }
    }

    /// Parameter domain `((u_min, u_max), (v_min, v_max))`.
    pub fn parameter_domain(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.knots_u[self.degree_u], self.knots_u[self.n_u]),
            (self.knots_v[self.degree_v], self.knots_v[self.n_v]),
        )
    }
}

// =============================================================================
// TGC conversion
// =============================================================================

/// NURBS faces of a TGC.
#[derive(Debug, Clone, PartialEq)]
pub struct TgcNurbs {
    /// Lateral surface; `v = 0` on the base ellipse, `v = 1` on the top.
    pub body: NurbsSurface,
    /// Base cap; `v = 0` at the center, `v = 1` on the rim.
    pub bottom: NurbsSurface,
    /// Top cap, absent when the top ellipse is degenerate.
    pub top: Option<NurbsSurface>,
}

/// Unit circle control points (x, y, weight) for a full quadratic circle.
fn circle_cps() -> [(f64, f64, f64); 9] {
    let w = std::f64::consts::FRAC_1_SQRT_2;
    [
        (1.0, 0.0, 1.0),
        (1.0, 1.0, w),
        (0.0, 1.0, 1.0),
        (-1.0, 1.0, w),
        (-1.0, 0.0, 1.0),
        (-1.0, -1.0, w),
        (0.0, -1.0, 1.0),
        (1.0, -1.0, w),
        (1.0, 0.0, 1.0),
    ]
}

const CIRCLE_KNOTS: [f64; 12] = [0.0, 0.0, 0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0];
const LINE_KNOTS: [f64; 4] = [0.0, 0.0, 1.0, 1.0];

/// Control row for the standard-space ellipse at height `z` with radii
/// `(rx, ry)`, mapped back to model space.
fn ellipse_row(from: &Transform, z: f64, rx: f64, ry: f64) -> Vec<WeightedPoint> {
    circle_cps()
        .iter()
        .map(|&(x, y, w)| WeightedPoint::new(from.apply_point(&Point3::new(rx * x, ry * y, z)), w))
        .collect()
}

fn ruled(rows: [Vec<WeightedPoint>; 2]) -> NurbsSurface {
    let n_u = rows[0].len();
    let [r0, r1] = rows;
    let mut cps = r0;
    cps.extend(r1);
    NurbsSurface::new(cps, n_u, 2, CIRCLE_KNOTS.to_vec(), LINE_KNOTS.to_vec(), 2, 1)
}

/// Exact NURBS representation of a prepared TGC.
pub fn to_nurbs(tgc: &PreparedTgc) -> TgcNurbs {
    let from = tgc.from_standard();
    let [ma, mb, mc, md] = tgc.mags();
    let (rx_top, ry_top) = (mc / ma, md / mb);

    let base_rim = ellipse_row(from, 0.0, 1.0, 1.0);
    let top_rim = ellipse_row(from, 1.0, rx_top, ry_top);

    let body = ruled([base_rim.clone(), top_rim.clone()]);
    let bottom = ruled([ellipse_row(from, 0.0, 0.0, 0.0), base_rim]);
    let top = (!tgc.top_degenerate()).then(|| ruled([ellipse_row(from, 1.0, 0.0, 0.0), top_rim]));

    TgcNurbs { body, bottom, top }
}
