#![warn(missing_docs)]

//! Ray tracing of the truncated general cone (TGC).
//!
//! A TGC definition is prepared once and then shot at any number of times:
//!
//! - [`prep`] - validate a [`TgcDef`](tgc_kernel_geom::TgcDef) and build the
//!   [`PreparedTgc`] (standard-space transforms and derived constants)
//! - [`shoot`] - intersect one [`Ray`], writing ordered [`Segment`]s into a
//!   per-worker [`Resource`]
//! - [`shoot_many`] - the same for many (solid, ray) pairs on rayon
//! - [`normal`], [`uv`], [`curvature`] - surface attributes at a [`Hit`]
//!
//! # Example
//!
//! ```
//! use tgc_kernel_geom::TgcDef;
//! use tgc_kernel_math::{Point3, Tolerance, Vec3};
//! use tgc_kernel_raytrace::{normal, prep, shoot, Ray, Resource};
//!
//! let def = TgcDef::trc(Point3::origin(), Vec3::new(0.0, 0.0, 10.0), 2.0, 1.0);
//! let tgc = prep(&def, &Tolerance::DEFAULT).unwrap();
//!
//! let mut res = Resource::new();
//! let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
//! let segs = shoot(&tgc, &ray, &mut res);
//! assert_eq!(segs.len(), 1);
//! assert!((segs[0].in_hit.dist - 5.0).abs() < 1e-9);
//! let n = normal(&tgc, &segs[0].out_hit);
//! assert!((n.z - 1.0).abs() < 1e-12);
//! ```

mod attrib;
mod batch;
pub mod error;
mod hit;
mod poly;
mod prep;
mod ray;
mod resource;
mod shot;

pub use attrib::{curvature, normal, uv, Curvature};
pub use batch::{shoot_many, shoot_many_with_stats};
pub use error::PrepError;
pub use hit::{Hit, Segment, SurfaceTag};
pub use prep::{canonicalize, prep, Bounds, PreparedTgc};
pub use ray::Ray;
pub use resource::{Resource, ShotStats};
pub use shot::shoot;
