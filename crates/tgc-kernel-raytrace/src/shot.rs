//! Ray shot: transform, solve, and resolve hits into segments.
//!
//! The ray is taken into standard space, where the lateral surface is
//! `X^2/R(z)^2 + Y^2/Q(z)^2 = 1` with `R`, `Q` linear in `z`, and the solid is
//! truncated by the planes `z = 0` and `z = 1`.

use crate::hit::{Hit, Segment, SurfaceTag};
use crate::poly::{real_roots, solve_quadratic, Poly, Roots, MAX_DEGREE};
use crate::prep::PreparedTgc;
use crate::resource::{Resource, ShotStats};
use crate::Ray;
use log::warn;
use tgc_kernel_math::Vec3;

/// Closest-approach offsets below this are snapped to zero.
const COR_SNAP: f64 = 1.0e-20;

/// A ray in standard space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StdRay {
    /// Ray origin mapped into standard space.
    pub pprime: Vec3,
    /// Unit standard-space direction.
    pub dprime: Vec3,
    /// Point of the ray closest to the standard-space origin.
    pub cor: Vec3,
    /// Ray parameter of `cor`, measured from `pprime`.
    pub cor_proj: f64,
    /// Standard-space parameter to world distance.
    pub t_scale: f64,
}

impl StdRay {
    /// Map a world ray into the standard space of `tgc`.
    ///
    /// Returns `None` when the direction collapses under the transform.
    pub fn new(tgc: &PreparedTgc, ray: &Ray) -> Option<Self> {
        let coef = tgc.tolerance().coef;
        let mut dprime = tgc.to_standard().apply_vec(ray.direction.as_ref());
        let len = dprime.norm();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        let t_scale = 1.0 / len;
        dprime *= t_scale;
        for x in dprime.iter_mut() {
            if x.abs() < coef {
                *x = 0.0;
            }
        }

        let pprime = tgc.to_standard().apply_point(&ray.origin).coords;
        let cor_proj = -pprime.dot(&dprime);
        let mut cor = pprime + dprime * cor_proj;
        for x in cor.iter_mut() {
            if x.abs() < COR_SNAP {
                *x = 0.0;
            }
        }

        Some(Self {
            pprime,
            dprime,
            cor,
            cor_proj,
            t_scale,
        })
    }

    /// Standard-space point at ray parameter `k`.
    #[inline]
    pub fn at(&self, k: f64) -> Vec3 {
        self.pprime + self.dprime * k
    }
}

/// Which polynomial to solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SolvePath {
    /// Quadratic when the end ellipses are similar, quartic otherwise.
    Auto,
    /// Always the quartic.
    Quartic,
}

/// Intersect `ray` with `tgc`.
///
/// Segments are written into the resource's pool and stay valid until the
/// next shot with the same resource. Distances are signed: hits behind the
/// ray origin are reported too. A miss, including a numerically
/// inconsistent one, yields an empty slice.
pub fn shoot<'r>(tgc: &PreparedTgc, ray: &Ray, res: &'r mut Resource) -> &'r [Segment] {
    shoot_with(tgc, ray, res, SolvePath::Auto)
}

pub(crate) fn shoot_with<'r>(
    tgc: &PreparedTgc,
    ray: &Ray,
    res: &'r mut Resource,
    path: SolvePath,
) -> &'r [Segment] {
    res.segs.clear();
    let stats = &mut res.stats;
    stats.shots += 1;

    let bounds = tgc.bounds();
    if !ray.hits_sphere(&bounds.center, bounds.loose_radius) {
        stats.sphere_misses += 1;
        stats.misses += 1;
        return &res.segs;
    }

    let consistent = match StdRay::new(tgc, ray) {
        Some(sr) => match solve(tgc, &sr, path, stats) {
            Some(roots) => resolve(tgc, ray, &sr, &roots, path, &mut res.segs),
            None => false,
        },
        None => true,
    };

    if !consistent {
        stats.inconsistencies += 1;
    }
    if res.segs.is_empty() {
        stats.misses += 1;
    } else {
        stats.hits += 1;
    }
    &res.segs
}

// =============================================================================
// Roots
// =============================================================================

/// Ray parameters (from `pprime`) of the lateral surface, sorted descending.
///
/// `None` is a numerical inconsistency and has already been logged.
fn solve(tgc: &PreparedTgc, sr: &StdRay, path: SolvePath, stats: &mut ShotStats) -> Option<Roots> {
    stats.solver_calls += 1;

    let (c, d) = (&sr.cor, &sr.dprime);
    let (ka, kb) = (tgc.c_over_a_minus_1(), tgc.d_over_b_minus_1());
    let x = Poly::linear(c.x, d.x);
    let y = Poly::linear(c.y, d.y);
    let r = Poly::linear(1.0 + ka * c.z, ka * d.z);
    let xx = x.mul(&x);
    let yy = y.mul(&y);
    let rr = r.mul(&r);

    let mut roots = if tgc.equal_eccentricities() && path == SolvePath::Auto {
        let p = xx.add(&yy).sub(&rr);
        solve_quadratic(p.c[2], p.c[1], p.c[0])
    } else {
        let q = Poly::linear(1.0 + kb * c.z, kb * d.z);
        let qq = q.mul(&q);
        let p = qq.mul(&xx).add(&rr.mul(&yy)).sub(&rr.mul(&qq));
        match real_roots(&p, tgc.tolerance().root_imag) {
            Ok(roots) => paired_roots(roots)?,
            Err(e) => {
                warn!("tgc: {e}; treating as a miss");
                return None;
            }
        }
    };

    for k in roots.as_mut_slice() {
        *k += sr.cor_proj;
    }
    roots.sort_descending();
    Some(roots)
}

/// A closed surface is crossed an even number of times; any other real root
/// count from the quartic is a numerical inconsistency.
fn paired_roots(roots: Roots) -> Option<Roots> {
    if matches!(roots.len(), 0 | 2 | 4) {
        Some(roots)
    } else {
        warn!(
            "tgc: quartic produced {} real roots, expected 0, 2 or 4; treating as a miss",
            roots.len()
        );
        None
    }
}

// =============================================================================
// Segments
// =============================================================================

/// Turn lateral roots into segments. Returns `false` on an inconsistency.
fn resolve(
    tgc: &PreparedTgc,
    ray: &Ray,
    sr: &StdRay,
    roots: &Roots,
    path: SolvePath,
    segs: &mut Vec<Segment>,
) -> bool {
    let mut interior = Roots::default();
    for &k in roots.as_slice() {
        let z = sr.pprime.z + k * sr.dprime.z;
        if z > 0.0 && z < 1.0 {
            interior.push(k);
        }
    }

    let hit = |k: f64, surface: SurfaceTag| Hit {
        dist: k * sr.t_scale,
        surface,
        std_point: sr.at(k),
    };

    let dz = sr.dprime.z;
    let caps = (dz != 0.0).then(|| CapCrossings::new(tgc, sr));
    let quartic = path == SolvePath::Quartic || !tgc.equal_eccentricities();

    match interior.len() {
        2 => {
            // A non-convex solid may be left through both caps as well.
            if let Some(caps) = caps.filter(|c| quartic && c.bottom && c.top) {
                return pair_crossings(interior.as_slice(), &caps, &hit, segs);
            }
            let (hi, lo) = (interior.as_slice()[0], interior.as_slice()[1]);
            segs.push(Segment {
                in_hit: hit(lo, SurfaceTag::Body),
                out_hit: hit(hi, SurfaceTag::Body),
            });
            true
        }
        1 => {
            let Some(caps) = caps else {
                warn!("tgc: single lateral hit on a ray parallel to the caps; treating as a miss");
                return false;
            };
            let other = if caps.bottom {
                hit(caps.k_bottom, SurfaceTag::Bottom)
            } else if caps.top {
                hit(caps.k_top, SurfaceTag::Top)
            } else {
                warn!("tgc: single lateral hit with no cap crossing; treating as a miss");
                return false;
            };
            let body = hit(interior.as_slice()[0], SurfaceTag::Body);
            let (in_hit, out_hit) = if body.dist <= other.dist {
                (body, other)
            } else {
                (other, body)
            };
            segs.push(Segment { in_hit, out_hit });
            true
        }
        0 => {
            // Parallel to the cap planes: nothing to clip.
            let Some(caps) = caps else {
                return true;
            };
            if !(caps.bottom && caps.top) {
                return true;
            }
            let bottom = hit(caps.k_bottom, SurfaceTag::Bottom);
            let top = hit(caps.k_top, SurfaceTag::Top);
            let seg = if tgc.top_normal().dot(ray.direction.as_ref()) > 0.0 {
                Segment {
                    in_hit: bottom,
                    out_hit: top,
                }
            } else {
                Segment {
                    in_hit: top,
                    out_hit: bottom,
                }
            };
            segs.push(seg);
            true
        }
        _ => match caps {
            Some(caps) => pair_crossings(interior.as_slice(), &caps, &hit, segs),
            None => pair_crossings(interior.as_slice(), &CapCrossings::NONE, &hit, segs),
        },
    }
}

/// Where the ray crosses the two cap planes, and whether it is inside the
/// cap ellipse there.
#[derive(Debug, Clone, Copy)]
struct CapCrossings {
    k_bottom: f64,
    k_top: f64,
    bottom: bool,
    top: bool,
}

impl CapCrossings {
    const NONE: Self = Self {
        k_bottom: 0.0,
        k_top: 0.0,
        bottom: false,
        top: false,
    };

    /// Requires a non-zero `dprime.z`.
    fn new(tgc: &PreparedTgc, sr: &StdRay) -> Self {
        let dz = sr.dprime.z;
        let k_bottom = -sr.pprime.z / dz;
        let k_top = (1.0 - sr.pprime.z) / dz;

        let b = sr.at(k_bottom);
        let alf1 = b.x * b.x + b.y * b.y;
        let t = sr.at(k_top);
        let alf2 = t.x * t.x * tgc.aa_over_cc() + t.y * t.y * tgc.bb_over_dd();

        Self {
            k_bottom,
            k_top,
            bottom: alf1 <= 1.0,
            top: alf2 <= 1.0,
        }
    }
}

/// Sort every boundary crossing and pair them into (entry, exit) segments.
fn pair_crossings(
    body: &[f64],
    caps: &CapCrossings,
    hit: &impl Fn(f64, SurfaceTag) -> Hit,
    segs: &mut Vec<Segment>,
) -> bool {
    let mut xs = [(0.0, SurfaceTag::Body); MAX_DEGREE + 2];
    let mut n = 0;
    for &k in body {
        xs[n] = (k, SurfaceTag::Body);
        n += 1;
    }
    if caps.bottom {
        xs[n] = (caps.k_bottom, SurfaceTag::Bottom);
        n += 1;
    }
    if caps.top {
        xs[n] = (caps.k_top, SurfaceTag::Top);
        n += 1;
    }

    if n % 2 != 0 {
        warn!("tgc: odd number of boundary crossings ({n}); treating as a miss");
        return false;
    }

    let xs = &mut xs[..n];
    xs.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in xs.chunks_exact(2) {
        segs.push(Segment {
            in_hit: hit(pair[0].0, pair[0].1),
            out_hit: hit(pair[1].0, pair[1].1),
        });
    }
    true
}
