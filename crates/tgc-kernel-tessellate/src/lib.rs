#![warn(missing_docs)]

//! Triangle mesh and NURBS output for the truncated general cone.
//!
//! A prepared TGC is meshed in its standard space, where every cross
//! section is an axis-aligned ellipse, and carried back to model space
//! with `from_standard`:
//! 1. Pick an angular step from the tessellation tolerances ([`plan`])
//! 2. Emit a fan for each non-degenerate end cap
//! 3. Emit a ruled lateral band between `nells` stacked ellipses
//!
//! [`to_nurbs`] gives the exact rational form of the same faces.

mod nurbs;

pub use nurbs::{to_nurbs, NurbsSurface, TgcNurbs, WeightedPoint};

use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use tgc_kernel_math::{Point3, Vec3};
use tgc_kernel_raytrace::PreparedTgc;

/// Output triangle mesh for rendering and export.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]` (u32).
    pub indices: Vec<u32>,
    /// Flat array of vertex normals: `[nx0, ny0, nz0, ...]` (f32). Same length as vertices.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            normals: Vec::new(),
        }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset));
    }

    fn push_vertex(&mut self, p: &Point3, n: &Vec3) {
        self.vertices
            .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        self.normals
            .extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
    }

    fn push_triangle(&mut self, i0: u32, i1: u32, i2: u32, flip: bool) {
        if flip {
            self.indices.extend_from_slice(&[i0, i2, i1]);
        } else {
            self.indices.extend_from_slice(&[i0, i1, i2]);
        }
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tolerances and planning
// =============================================================================

/// Tessellation tolerances. A value `<= 0` leaves that tolerance unset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessTolerance {
    /// Maximum distance between a chord and the true ellipse.
    pub abs: f64,
    /// Chord sagitta as a fraction of the largest end diameter.
    pub rel: f64,
    /// Maximum angle (radians) between adjacent facet normals.
    pub norm: f64,
}

impl Default for TessTolerance {
    fn default() -> Self {
        Self {
            abs: 0.0,
            rel: 0.01,
            norm: 0.0,
        }
    }
}

/// Facet counts chosen for one TGC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessPlan {
    /// Angular samples per quarter turn (at least 2).
    pub segs_per_quadrant: usize,
    /// Samples around each ellipse: `4 * segs_per_quadrant`.
    pub nsegs: usize,
    /// Number of stacked ellipses along the height (at least 2).
    pub nells: usize,
}

/// Angle subtended by a chord whose sagitta on a circle of radius `r` is `d`.
fn sagitta_angle(d: f64, r: f64) -> f64 {
    2.0 * (1.0 - d / r).acos()
}

/// Choose the facet counts for `tgc` under `ttol`.
pub fn plan(tgc: &PreparedTgc, ttol: &TessTolerance) -> TessPlan {
    let r_max = tgc.mags().iter().copied().fold(0.0_f64, f64::max);

    let mut alpha = FRAC_PI_2;
    if ttol.abs > 0.0 && ttol.abs < r_max {
        alpha = alpha.min(sagitta_angle(ttol.abs, r_max));
    }
    if ttol.rel > 0.0 && ttol.rel < 1.0 {
        let d = ttol.rel * 2.0 * r_max;
        if d < r_max {
            alpha = alpha.min(sagitta_angle(d, r_max));
        }
    }
    if ttol.norm > 0.0 {
        alpha = alpha.min(ttol.norm);
    }

    let segs_per_quadrant = ((FRAC_PI_2 / alpha - 1e-9).ceil() as usize).max(2);
    let nsegs = 4 * segs_per_quadrant;

    let chord = 2.0 * r_max * (PI / nsegs as f64).sin();
    let height = tgc.def().h.norm();
    let nells = if height > 3.0 * chord {
        (height / (3.0 * chord)).ceil() as usize + 1
    } else {
        2
    };

    TessPlan {
        segs_per_quadrant,
        nsegs,
        nells,
    }
}

// =============================================================================
// Meshing
// =============================================================================

/// Tessellate a prepared TGC into a closed, outward-wound triangle mesh.
pub fn tessellate(tgc: &PreparedTgc, ttol: &TessTolerance) -> TriangleMesh {
    let plan = plan(tgc, ttol);
    let TessPlan { nsegs, nells, .. } = plan;
    debug!(
        "tessellating tgc: {} per quadrant, {} around, {} ellipses",
        plan.segs_per_quadrant, nsegs, nells
    );

    let from = tgc.from_standard();
    let lin = from.linear();
    let det = lin.determinant();
    // A mirrored frame reverses every winding and cross product.
    let flip = det < 0.0;
    let handed = if flip { -1.0 } else { 1.0 };

    let ka = tgc.c_over_a_minus_1();
    let kb = tgc.d_over_b_minus_1();
    let radii = |z: f64| (1.0 + ka * z, 1.0 + kb * z);

    let angles: Vec<(f64, f64)> = (0..nsegs)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / nsegs as f64;
            (theta.cos(), theta.sin())
        })
        .collect();
    let rim = |z: f64, (cos, sin): (f64, f64)| {
        let (r, q) = radii(z);
        from.apply_point(&Point3::new(r * cos, q * sin, z))
    };

    let mut mesh = TriangleMesh::new();
    let n: u32 = nsegs as u32;
    let up: Vec3 = tgc.top_normal().into_inner();

    // Base cap, wound to face -top_normal.
    let b0 = mesh.num_vertices() as u32;
    for &cs in &angles {
        mesh.push_vertex(&rim(0.0, cs), &-up);
    }
    for i in 1..n - 1 {
        mesh.push_triangle(b0, b0 + i + 1, b0 + i, flip);
    }

    if !tgc.top_degenerate() {
        let t0 = mesh.num_vertices() as u32;
        for &cs in &angles {
            mesh.push_vertex(&rim(1.0, cs), &up);
        }
        for i in 1..n - 1 {
            mesh.push_triangle(t0, t0 + i, t0 + i + 1, flip);
        }
    }

    // Lateral band.
    let l0 = mesh.num_vertices() as u32;
    for k in 0..nells {
        let z = k as f64 / (nells - 1) as f64;
        let (r, q) = radii(z);
        for &(cos, sin) in &angles {
            let mut tangent = Vec3::new(-r * sin, q * cos, 0.0);
            if tangent.norm() < 1e-12 {
                tangent = Vec3::new(-sin, cos, 0.0);
            }
            let ruling = Vec3::new(ka * cos, kb * sin, 1.0);
            let normal = (lin * tangent).cross(&(lin * ruling)) * handed;
            let normal = normal.try_normalize(1e-300).unwrap_or(up);
            mesh.push_vertex(&rim(z, (cos, sin)), &normal);
        }
    }
    for k in 0..(nells as u32 - 1) {
        let bot = l0 + k * n;
        let top = bot + n;
        for i in 0..n {
            let i1 = (i + 1) % n;
            mesh.push_triangle(bot + i, bot + i1, top + i, flip);
            mesh.push_triangle(bot + i1, top + i1, top + i, flip);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tgc_kernel_geom::TgcDef;
    use tgc_kernel_math::Tolerance;
    use tgc_kernel_raytrace::prep;

    fn prepped(def: &TgcDef) -> PreparedTgc {
        prep(def, &Tolerance::DEFAULT).unwrap()
    }

    fn only_norm(norm: f64) -> TessTolerance {
        TessTolerance {
            abs: 0.0,
            rel: 0.0,
            norm,
        }
    }

    fn vertex(mesh: &TriangleMesh, i: usize) -> [f64; 3] {
        let v = &mesh.vertices[i * 3..i * 3 + 3];
        [v[0] as f64, v[1] as f64, v[2] as f64]
    }

    /// Signed volume of a closed triangle mesh (positive when wound outward).
    fn compute_mesh_volume(mesh: &TriangleMesh) -> f64 {
        let mut vol = 0.0;
        for tri in mesh.indices.chunks(3) {
            let v0 = vertex(mesh, tri[0] as usize);
            let v1 = vertex(mesh, tri[1] as usize);
            let v2 = vertex(mesh, tri[2] as usize);
            vol += v0[0] * (v1[1] * v2[2] - v2[1] * v1[2])
                - v1[0] * (v0[1] * v2[2] - v2[1] * v0[2])
                + v2[0] * (v0[1] * v1[2] - v1[1] * v0[2]);
        }
        vol / 6.0
    }

    fn frustum() -> TgcDef {
        TgcDef::trc(Point3::origin(), Vec3::new(0.0, 0.0, 1.0), 2.0, 1.0)
    }

    #[test]
    fn test_plan_from_normal_tolerance() {
        let tgc = prepped(&frustum());
        let p = plan(&tgc, &only_norm(0.55));
        assert_eq!(
            p,
            TessPlan {
                segs_per_quadrant: 3,
                nsegs: 12,
                nells: 2
            }
        );
    }

    #[test]
    fn test_vertex_count() {
        let tgc = prepped(&frustum());
        let mesh = tessellate(&tgc, &only_norm(0.55));
        assert_eq!(mesh.num_vertices(), 2 * 12 + 12 * 2);
        assert_eq!(mesh.num_triangles(), 2 * 10 + 2 * 12);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
    }

    #[test]
    fn test_plan_from_abs_and_rel() {
        let tgc = prepped(&TgcDef::rcc(
            Point3::origin(),
            Vec3::new(0.0, 0.0, 1.0),
            10.0,
        ));
        // 2 acos(0.99) = 0.2838 rad, 5.53 steps per quadrant.
        let abs = TessTolerance {
            abs: 0.1,
            rel: 0.0,
            norm: 0.0,
        };
        assert_eq!(plan(&tgc, &abs).segs_per_quadrant, 6);

        // rel 0.005 of a diameter of 20 is the same sagitta.
        let rel = TessTolerance {
            abs: 0.0,
            rel: 0.005,
            norm: 0.0,
        };
        assert_eq!(plan(&tgc, &rel).segs_per_quadrant, 6);

        // The finest tolerance governs.
        let both = TessTolerance { norm: 0.1, ..abs };
        assert_eq!(plan(&tgc, &both).segs_per_quadrant, 16);

        // Nothing set still yields a valid plan.
        let none = only_norm(0.0);
        assert_eq!(plan(&tgc, &none).segs_per_quadrant, 2);
    }

    #[test]
    fn test_tall_solid_gets_intermediate_ellipses() {
        let tgc = prepped(&TgcDef::rcc(
            Point3::origin(),
            Vec3::new(0.0, 0.0, 100.0),
            1.0,
        ));
        let p = plan(&tgc, &only_norm(0.55));
        // chord = 2 sin(pi/12) = 0.5176
        let chord = 2.0 * (PI / 12.0).sin();
        assert_eq!(p.nells, (100.0 / (3.0 * chord)).ceil() as usize + 1);
        let mesh = tessellate(&tgc, &only_norm(0.55));
        assert_eq!(mesh.num_vertices(), 2 * p.nsegs + p.nsegs * p.nells);
    }

    #[test]
    fn test_mesh_volume_approaches_solid_volume() {
        let def = TgcDef::new(
            Point3::new(1.0, -2.0, 3.0),
            Vec3::new(2.0, 1.0, 5.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let tgc = prepped(&def);
        let mesh = tessellate(&tgc, &only_norm(0.05));
        let vol = compute_mesh_volume(&mesh);
        assert!(vol > 0.0);
        assert_relative_eq!(vol, def.volume(), max_relative = 1e-2);
    }

    #[test]
    fn test_outward_normals_on_right_cone() {
        let tgc = prepped(&frustum());
        let mesh = tessellate(&tgc, &only_norm(0.3));
        let p = plan(&tgc, &only_norm(0.3));
        for i in 0..mesh.num_vertices() {
            let n = &mesh.normals[i * 3..i * 3 + 3];
            let n = Vec3::new(n[0] as f64, n[1] as f64, n[2] as f64);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
            let v = vertex(&mesh, i);
            if i < p.nsegs {
                assert_relative_eq!(n.z, -1.0, epsilon = 1e-6);
            } else if i < 2 * p.nsegs {
                assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
            } else {
                let radial = Vec3::new(v[0], v[1], 0.0);
                assert!(n.dot(&radial) > 0.0);
                // Frustum narrows upward, so the side faces tilt up.
                assert!(n.z > 0.0);
            }
        }
    }

    #[test]
    fn test_pointed_end_emits_no_cap() {
        // Apex at the base: prep swaps the ends, leaving a degenerate top.
        let def = TgcDef::trc(Point3::origin(), Vec3::new(0.0, 0.0, 4.0), 0.0, 2.0);
        let tgc = prepped(&def);
        assert!(tgc.top_degenerate());
        let p = plan(&tgc, &only_norm(0.55));
        let mesh = tessellate(&tgc, &only_norm(0.55));
        assert_eq!(mesh.num_vertices(), p.nsegs + p.nsegs * p.nells);
        assert!(compute_mesh_volume(&mesh) > 0.0);
        for n in mesh.normals.chunks(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_merge_offsets_indices() {
        let tgc = prepped(&frustum());
        let a = tessellate(&tgc, &only_norm(0.55));
        let mut merged = a.clone();
        merged.merge(&a);
        assert_eq!(merged.num_vertices(), 2 * a.num_vertices());
        assert_eq!(merged.num_triangles(), 2 * a.num_triangles());
        let offset = a.num_vertices() as u32;
        assert_eq!(merged.indices[a.indices.len()], a.indices[0] + offset);
        assert_relative_eq!(
            compute_mesh_volume(&merged),
            2.0 * compute_mesh_volume(&a),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_tolerance_from_toml() {
        let t: TessTolerance = toml::from_str("norm = 0.2").unwrap();
        assert_eq!(t.norm, 0.2);
        assert_eq!(t.rel, TessTolerance::default().rel);
    }
}
