#![warn(missing_docs)]

//! Truncated general cone (TGC) solver kernel.
//!
//! Ties the kernel crates together: definitions from
//! [`tgc_kernel_geom`], ray shooting and surface attributes from
//! [`tgc_kernel_raytrace`], meshes and NURBS from [`tgc_kernel_tessellate`],
//! plus a TOML [`KernelConfig`] and a [`Scene`] of many solids.
//!
//! # Example
//!
//! ```
//! use tgc_kernel::{KernelConfig, Point3, Ray, Resource, Scene, TgcDef, Vec3};
//!
//! let config = KernelConfig::from_toml_str("[tessellation]\nnorm = 0.3").unwrap();
//! let defs = [
//!     TgcDef::rcc(Point3::origin(), Vec3::new(0.0, 0.0, 4.0), 1.0),
//!     TgcDef::rcc(Point3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 2.0), 1.0),
//! ];
//! let scene = Scene::load(&defs, &config);
//!
//! let mut res = Resource::new();
//! let ray = Ray::new(Point3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
//! let segs = scene.shoot(&ray, &mut res);
//! assert_eq!(segs.len(), 2);
//! assert_eq!(segs[0].solid, 0);
//!
//! let mesh = scene.tessellate();
//! assert!(mesh.num_triangles() > 0);
//! ```

mod config;
mod scene;

pub use tgc_kernel_geom;
pub use tgc_kernel_math;
pub use tgc_kernel_raytrace;
pub use tgc_kernel_tessellate;

pub use config::{ConfigError, KernelConfig};
pub use scene::{Rejected, Scene, SceneSegment};

pub use tgc_kernel_geom::{TgcDef, TgcKind};
pub use tgc_kernel_math::{Point3, Tolerance, Transform, Vec3};
pub use tgc_kernel_raytrace::{
    curvature, normal, prep, shoot, shoot_many, uv, Hit, PrepError, PreparedTgc, Ray,
    Resource, Segment, ShotStats, SurfaceTag,
};
pub use tgc_kernel_tessellate::{tessellate, to_nurbs, TessTolerance, TgcNurbs, TriangleMesh};
