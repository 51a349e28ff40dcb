//! Polynomials of degree at most four and their real roots.
//!
//! Coefficients are stored in ascending order: `c[0] + c[1] t + c[2] t^2 ...`.
//! Everything lives in fixed-size arrays on the stack.

use crate::error::PolyError;
use nalgebra::Complex;

/// Highest degree handled here.
pub(crate) const MAX_DEGREE: usize = 4;

/// Leading coefficients smaller than this fraction of the largest are dropped.
/// Anything larger is kept: a tiny leading term only moves a root far away.
const DEGREE_TRIM: f64 = 1.0e-30;

/// Quadratic and linear leading coefficients below this are treated as zero.
const QUAD_EPS: f64 = 1.0e-12;

/// Laguerre: fractional steps used to break limit cycles.
const FRAC: [f64; 9] = [0.0, 0.5, 0.25, 0.75, 0.13, 0.38, 0.62, 0.88, 1.0];
/// Laguerre: iterations between fractional steps.
const MT: usize = 10;
/// Laguerre: iteration cap.
const MAX_IT: usize = MT * (FRAC.len() - 1);
/// Laguerre: relative round-off in evaluating the polynomial.
const EPSS: f64 = 1.0e-14;

/// A real polynomial of degree at most [`MAX_DEGREE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Poly {
    pub c: [f64; MAX_DEGREE + 1],
    pub degree: usize,
}

impl Poly {
    /// `c0 + c1 t`.
    pub fn linear(c0: f64, c1: f64) -> Self {
        let mut c = [0.0; MAX_DEGREE + 1];
        c[0] = c0;
        c[1] = c1;
        Self { c, degree: 1 }
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let degree = self.degree + other.degree;
        debug_assert!(degree <= MAX_DEGREE);
        let mut c = [0.0; MAX_DEGREE + 1];
        for i in 0..=self.degree {
            for j in 0..=other.degree {
                c[i + j] += self.c[i] * other.c[j];
            }
        }
        Poly { c, degree }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut c = self.c;
        for (ci, oi) in c.iter_mut().zip(other.c.iter()) {
            *ci += oi;
        }
        Poly {
            c,
            degree: self.degree.max(other.degree),
        }
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        let mut c = self.c;
        for (ci, oi) in c.iter_mut().zip(other.c.iter()) {
            *ci -= oi;
        }
        Poly {
            c,
            degree: self.degree.max(other.degree),
        }
    }

    #[cfg(test)]
    pub fn eval(&self, t: f64) -> f64 {
        self.c[..=self.degree]
            .iter()
            .rev()
            .fold(0.0, |acc, &ci| acc * t + ci)
    }

    /// Drop leading coefficients that vanish next to the largest one.
    fn trimmed(&self) -> Poly {
        let max = self.c[..=self.degree]
            .iter()
            .fold(0.0f64, |m, ci| m.max(ci.abs()));
        let mut out = *self;
        while out.degree > 0 && out.c[out.degree].abs() <= DEGREE_TRIM * max {
            out.c[out.degree] = 0.0;
            out.degree -= 1;
        }
        out
    }
}

/// Up to four real roots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Roots {
    vals: [f64; MAX_DEGREE],
    len: usize,
}

impl Roots {
    pub fn push(&mut self, r: f64) {
        if self.len < MAX_DEGREE {
            self.vals[self.len] = r;
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.vals[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.vals[..self.len]
    }

    /// Sort in descending order. At most four entries, so a bubble pass does.
    pub fn sort_descending(&mut self) {
        let v = self.as_mut_slice();
        let n = v.len();
        for i in 1..n {
            for j in 0..n - i {
                if v[j] < v[j + 1] {
                    v.swap(j, j + 1);
                }
            }
        }
    }
}

// =============================================================================
// Closed form
// =============================================================================

/// Real roots of `a t^2 + b t + c`.
///
/// A vanishing `a` falls back to the linear root; a vanishing `b` as well
/// yields no roots. A zero discriminant reports the double root twice.
pub(crate) fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::default();
    if a.abs() < QUAD_EPS {
        if b.abs() >= QUAD_EPS {
            roots.push(-c / b);
        }
        return roots;
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    let sq = disc.sqrt();
    let q = -0.5 * (b + b.signum() * sq);
    if q == 0.0 {
        // b == 0 and disc == 0, so c == 0
        roots.push(0.0);
        roots.push(0.0);
    } else {
        roots.push(q / a);
        roots.push(c / q);
    }
    roots
}

// =============================================================================
// Laguerre
// =============================================================================

/// Improve `x` towards a root of the complex polynomial `a` (ascending).
fn laguerre(a: &[Complex<f64>], x: &mut Complex<f64>) -> Result<(), PolyError> {
    let m = a.len() - 1;
    let mf = m as f64;
    for iter in 1..=MAX_IT {
        let mut b = a[m];
        let mut err = b.norm();
        let mut d = Complex::new(0.0, 0.0);
        let mut f = Complex::new(0.0, 0.0);
        let abx = x.norm();
        for j in (0..m).rev() {
            f = *x * f + d;
            d = *x * d + b;
            b = *x * b + a[j];
            err = b.norm() + abx * err;
        }
        err *= EPSS;
        if b.norm() <= err {
            return Ok(());
        }

        let g = d / b;
        let g2 = g * g;
        let h = g2 - f * 2.0 / b;
        let sq = ((h * mf - g2) * (mf - 1.0)).sqrt();
        let gp = g + sq;
        let gm = g - sq;
        let (abp, abm) = (gp.norm(), gm.norm());
        let denom = if abp < abm { gm } else { gp };
        let dx = if abp.max(abm) > 0.0 {
            Complex::new(mf, 0.0) / denom
        } else {
            Complex::from_polar(1.0 + abx, iter as f64)
        };

        let x1 = *x - dx;
        if *x == x1 {
            return Ok(());
        }
        if iter % MT != 0 {
            *x = x1;
        } else {
            *x -= dx * FRAC[iter / MT];
        }
    }
    Err(PolyError::NoConvergence(m))
}

/// All complex roots of `p`, found by Laguerre with deflation and polishing.
///
/// Returns the roots in a fixed array together with their count (the
/// degree after trimming vanishing leading coefficients).
pub(crate) fn complex_roots(
    p: &Poly,
) -> Result<([Complex<f64>; MAX_DEGREE], usize), PolyError> {
    let p = p.trimmed();
    let m = p.degree;
    let zero = Complex::new(0.0, 0.0);
    let mut roots = [zero; MAX_DEGREE];
    if m == 0 {
        return Ok((roots, 0));
    }

    let mut full = [zero; MAX_DEGREE + 1];
    for (z, &ci) in full.iter_mut().zip(p.c.iter()) {
        *z = Complex::new(ci, 0.0);
    }
    let mut ad = full;

    for j in (1..=m).rev() {
        let mut x = zero;
        laguerre(&ad[..=j], &mut x)?;
        if x.im.abs() <= 2.0 * EPSS * x.re.abs() {
            x.im = 0.0;
        }
        roots[j - 1] = x;

        // forward deflation by (t - x)
        let mut b = ad[j];
        for jj in (0..j).rev() {
            let c = ad[jj];
            ad[jj] = b;
            b = x * b + c;
        }
    }

    for r in roots.iter_mut().take(m) {
        let mut polished = *r;
        if laguerre(&full[..=m], &mut polished).is_ok() {
            *r = polished;
        }
    }
    Ok((roots, m))
}

/// Real roots of `p`: complex roots whose imaginary part is within `imag_tol`.
pub(crate) fn real_roots(p: &Poly, imag_tol: f64) -> Result<Roots, PolyError> {
    let (cr, n) = complex_roots(p)?;
    let mut roots = Roots::default();
    for z in cr.iter().take(n) {
        if z.im.abs() <= imag_tol {
            roots.push(z.re);
        }
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(r: &Roots) -> Vec<f64> {
        let mut v = r.as_slice().to_vec();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    #[test]
    fn test_poly_arithmetic() {
        // (1 + t)(2 - t) = 2 + t - t^2
        let p = Poly::linear(1.0, 1.0).mul(&Poly::linear(2.0, -1.0));
        assert_eq!(p.degree, 2);
        assert_eq!(&p.c[..3], &[2.0, 1.0, -1.0]);
        assert_eq!(p.eval(2.0), 0.0);

        let q = p.sub(&p.mul(&Poly::linear(0.0, 0.0)));
        assert_eq!(q.c, p.c);
        let s = p.add(&Poly::linear(-2.0, 0.0));
        assert_eq!(s.eval(1.0), 0.0);
    }

    #[test]
    fn test_quadratic() {
        let r = solve_quadratic(1.0, -3.0, 2.0);
        assert_eq!(sorted(&r), vec![1.0, 2.0]);

        assert_eq!(solve_quadratic(1.0, 0.0, 1.0).len(), 0);

        // linear fallback
        let lin = solve_quadratic(0.0, 2.0, -4.0);
        assert_eq!(lin.as_slice(), &[2.0]);
        assert_eq!(solve_quadratic(0.0, 0.0, 1.0).len(), 0);

        // double root is reported twice
        let d = solve_quadratic(1.0, -2.0, 1.0);
        assert_eq!(d.as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn test_quartic_four_real_roots() {
        // (t-1)(t+1)(t-2)(t+3)
        let p = Poly::linear(-1.0, 1.0)
            .mul(&Poly::linear(1.0, 1.0))
            .mul(&Poly::linear(-2.0, 1.0))
            .mul(&Poly::linear(3.0, 1.0));
        let r = real_roots(&p, 1e-4).unwrap();
        let v = sorted(&r);
        assert_eq!(v.len(), 4);
        for (got, want) in v.iter().zip([-3.0, -1.0, 1.0, 2.0]) {
            assert!((got - want).abs() < 1e-10, "{got} vs {want}");
        }
    }

    #[test]
    fn test_quartic_complex_pair_dropped() {
        // (t^2 + 1)(t - 0.5)(t - 4)
        let t2p1 = Poly::linear(0.0, 1.0)
            .mul(&Poly::linear(0.0, 1.0))
            .add(&Poly::linear(1.0, 0.0));
        let p = t2p1
            .mul(&Poly::linear(-0.5, 1.0))
            .mul(&Poly::linear(-4.0, 1.0));
        let v = sorted(&real_roots(&p, 1e-4).unwrap());
        assert_eq!(v.len(), 2);
        assert!((v[0] - 0.5).abs() < 1e-10);
        assert!((v[1] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_vanishing_leading_coefficient() {
        // 1e-40 t^4 + (t - 1)(t - 2)
        let mut p = Poly::linear(-1.0, 1.0).mul(&Poly::linear(-2.0, 1.0));
        p.c[4] = 1e-40;
        p.degree = 4;
        let v = sorted(&real_roots(&p, 1e-4).unwrap());
        assert_eq!(v.len(), 2);
        assert!((v[0] - 1.0).abs() < 1e-10);
        assert!((v[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_sort_descending() {
        let mut r = Roots::default();
        for x in [0.5, 3.0, -1.0, 2.0] {
            r.push(x);
        }
        r.sort_descending();
        assert_eq!(r.as_slice(), &[3.0, 2.0, 0.5, -1.0]);
    }
}
