//! Error types for prep and the polynomial solver.

use thiserror::Error;

/// Reasons a TGC definition is rejected at prep time.
///
/// A rejected solid is excluded from the scene; nothing else is affected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrepError {
    /// Height vector is too short.
    #[error("zero-length height vector (|H| = {0:e})")]
    ZeroHeight(f64),

    /// Each end ellipse collapses to a point or a line.
    #[error("both end ellipses are degenerate")]
    DegenerateEnds,

    /// A base axis is still zero after the ends were canonicalized.
    #[error("base ellipse axis is degenerate (|A| = {a:e}, |B| = {b:e})")]
    DegenerateAxis {
        /// Magnitude of A.
        a: f64,
        /// Magnitude of B.
        b: f64,
    },

    /// Height vector lies in the plane of the base ellipse.
    #[error("height vector is coplanar with the base ellipse (cos = {0:e})")]
    CoplanarHeight(f64),

    /// The two axes of an end ellipse are not perpendicular.
    #[error("{end} ellipse axes are not perpendicular (cos = {cos:e})")]
    NotPerpendicular {
        /// Which end: "base" or "top".
        end: &'static str,
        /// Normalized dot product of the two axes.
        cos: f64,
    },

    /// Corresponding base and top axes are not parallel.
    #[error("{pair} are not parallel (sin = {sin:e})")]
    NotParallel {
        /// Which axis pair: "A and C" or "B and D".
        pair: &'static str,
        /// Normalized cross-product magnitude.
        sin: f64,
    },

    /// The normalizing transform could not be inverted.
    #[error("normalizing transform is singular")]
    SingularTransform,
}

/// Result type for prep.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Failures of the complex root finder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolyError {
    /// Laguerre iteration did not settle.
    #[error("root finder did not converge for degree {0}")]
    NoConvergence(usize),
}
