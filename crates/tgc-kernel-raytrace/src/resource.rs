//! Per-worker shot state.

use crate::Segment;

/// Counters collected while shooting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShotStats {
    /// Rays shot.
    pub shots: u64,
    /// Rays rejected by the bounding sphere before any solving.
    pub sphere_misses: u64,
    /// Invocations of the quadratic or quartic solver.
    pub solver_calls: u64,
    /// Shots that produced at least one segment.
    pub hits: u64,
    /// Shots that produced nothing.
    pub misses: u64,
    /// Misses caused by numerically inconsistent roots.
    pub inconsistencies: u64,
}

impl ShotStats {
    /// Add another worker's counters into these.
    pub fn merge(&mut self, other: &ShotStats) {
        self.shots += other.shots;
        self.sphere_misses += other.sphere_misses;
        self.solver_calls += other.solver_calls;
        self.hits += other.hits;
        self.misses += other.misses;
        self.inconsistencies += other.inconsistencies;
    }
}

/// Mutable state owned by one worker: the segment pool and counters.
///
/// A `Resource` is never shared between threads. Segments returned by a
/// shot live in the pool until the next shot on the same resource.
#[derive(Debug, Default)]
pub struct Resource {
    pub(crate) segs: Vec<Segment>,
    /// Counters for every shot made with this resource.
    pub stats: ShotStats,
}

impl Resource {
    /// Create an empty resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments from the most recent shot.
    pub fn segments(&self) -> &[Segment] {
        &self.segs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_stats() {
        let mut a = ShotStats {
            shots: 3,
            hits: 1,
            misses: 2,
            ..Default::default()
        };
        let b = ShotStats {
            shots: 2,
            sphere_misses: 1,
            solver_calls: 1,
            misses: 2,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.shots, 5);
        assert_eq!(a.misses, 4);
        assert_eq!(a.sphere_misses, 1);
        assert_eq!(a.hits, 1);
    }
}
