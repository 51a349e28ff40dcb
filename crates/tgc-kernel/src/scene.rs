//! A set of prepared TGCs that can be shot and meshed together.

use crate::KernelConfig;
use log::warn;
use rayon::prelude::*;
use tgc_kernel_geom::TgcDef;
use tgc_kernel_raytrace::{prep, shoot, PrepError, PreparedTgc, Ray, Resource, Segment};
use tgc_kernel_tessellate::{tessellate, TriangleMesh};

/// A definition that failed to prepare.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// Index of the definition in the input to [`Scene::load`].
    pub index: usize,
    /// Why prep refused it.
    pub error: PrepError,
}

/// A segment tagged with the solid that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSegment {
    /// Index of the solid's definition in the input to [`Scene::load`].
    pub solid: usize,
    /// The entry/exit pair.
    pub segment: Segment,
}

/// Prepared solids plus the configuration they were prepared with.
#[derive(Debug, Clone)]
pub struct Scene {
    config: KernelConfig,
    solids: Vec<(usize, PreparedTgc)>,
    rejected: Vec<Rejected>,
}

impl Scene {
    /// Prepare every definition. Failures are logged and recorded; the
    /// remaining solids are kept.
    pub fn load(defs: &[TgcDef], config: &KernelConfig) -> Self {
        let mut solids = Vec::with_capacity(defs.len());
        let mut rejected = Vec::new();
        for (index, def) in defs.iter().enumerate() {
            match prep(def, &config.tolerance) {
                Ok(tgc) => solids.push((index, tgc)),
                Err(error) => {
                    warn!("tgc {}: rejected: {}", index, error);
                    rejected.push(Rejected { index, error });
                }
            }
        }
        Self {
            config: *config,
            solids,
            rejected,
        }
    }

    /// Configuration the scene was loaded with.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Number of prepared solids.
    pub fn len(&self) -> usize {
        self.solids.len()
    }

    /// True when no definition survived prep.
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Prepared solids with their input indices.
    pub fn solids(&self) -> impl Iterator<Item = (usize, &PreparedTgc)> {
        self.solids.iter().map(|(i, tgc)| (*i, tgc))
    }

    /// Definitions that failed to prepare.
    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    /// Shoot one ray at every solid whose bounding box the ray's line
    /// touches. Segments are sorted by entry distance.
    pub fn shoot(&self, ray: &Ray, res: &mut Resource) -> Vec<SceneSegment> {
        let mut out = Vec::new();
        for (solid, tgc) in &self.solids {
            if ray.intersect_aabb_line(&tgc.bounds().aabb).is_none() {
                continue;
            }
            out.extend(shoot(tgc, ray, res).iter().map(|&segment| SceneSegment {
                solid: *solid,
                segment,
            }));
        }
        out.sort_by(|a, b| a.segment.in_hit.dist.total_cmp(&b.segment.in_hit.dist));
        out
    }

    /// [`Scene::shoot`] for many rays on rayon, one [`Resource`] per worker.
    pub fn shoot_rays(&self, rays: &[Ray]) -> Vec<Vec<SceneSegment>> {
        rays.par_iter()
            .map_init(Resource::new, |res, ray| self.shoot(ray, res))
            .collect()
    }

    /// Mesh every solid with the scene's tessellation tolerances and merge.
    pub fn tessellate(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for (_, tgc) in &self.solids {
            mesh.merge(&tessellate(tgc, &self.config.tessellation));
        }
        mesh
    }
}
