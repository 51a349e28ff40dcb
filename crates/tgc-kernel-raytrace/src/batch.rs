//! Batched shots on the rayon thread pool.

use crate::resource::{Resource, ShotStats};
use crate::shot::shoot;
use crate::{PreparedTgc, Ray, Segment};
use rayon::prelude::*;

/// Shoot `rays[i]` at `tgcs[i]` for every `i`, in parallel.
///
/// Each worker thread gets its own [`Resource`]. The output is index aligned
/// with the input and identical to calling [`shoot`] pair by pair.
///
/// # Panics
///
/// Panics if the two slices have different lengths.
pub fn shoot_many(tgcs: &[&PreparedTgc], rays: &[Ray]) -> Vec<Vec<Segment>> {
    shoot_many_with_stats(tgcs, rays).0
}

/// [`shoot_many`], also returning the counters summed over all workers.
///
/// # Panics
///
/// Panics if the two slices have different lengths.
pub fn shoot_many_with_stats(
    tgcs: &[&PreparedTgc],
    rays: &[Ray],
) -> (Vec<Vec<Segment>>, ShotStats) {
    assert_eq!(
        tgcs.len(),
        rays.len(),
        "shoot_many needs one ray per solid"
    );

    let (segs, stats): (Vec<Vec<Segment>>, Vec<ShotStats>) = tgcs
        .par_iter()
        .zip(rays.par_iter())
        .map_init(Resource::new, |res, (tgc, ray)| {
            let segs = shoot(tgc, ray, res).to_vec();
            (segs, std::mem::take(&mut res.stats))
        })
        .unzip();

    let mut total = ShotStats::default();
    for s in &stats {
        total.merge(s);
    }
    (segs, total)
}
