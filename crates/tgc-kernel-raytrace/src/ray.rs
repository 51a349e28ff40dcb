//! Ray representation and basic ray-bound tests.

use tgc_kernel_math::{Aabb3, Dir3, Point3, Vec3};

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            if inv.x < 0.0 { 1 } else { 0 },
            if inv.y < 0.0 { 1 } else { 0 },
            if inv.z < 0.0 { 1 } else { 0 },
        ];
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
            sign,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Slab test of the full line against a box.
    ///
    /// Returns the entry and exit parameters, which may be negative: the
    /// solver reports hits behind the origin and leaves culling to callers.
    #[inline]
    pub fn intersect_aabb_line(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];

        let tx1 = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let tx2 = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let mut t_min = tx1;
        let mut t_max = tx2;

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        t_min = t_min.max(tz1);
        t_max = t_max.min(tz2);

        if t_max >= t_min {
            Some((t_min, t_max))
        } else {
            None
        }
    }

    /// Distance from the (infinite) line of this ray to a point.
    pub fn distance_to_point(&self, p: &Point3) -> f64 {
        let to = p - self.origin;
        let along = to.dot(self.direction.as_ref());
        (to - self.direction.as_ref() * along).norm()
    }

    /// True when the line of this ray passes within `radius` of `center`.
    #[inline]
    pub fn hits_sphere(&self, center: &Point3, radius: f64) -> bool {
        self.distance_to_point(center) <= radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
        assert!(p.z.abs() < 1e-12);
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.intersect_aabb_line(&unit_box()).unwrap();
        assert!((t_min - 5.0).abs() < 1e-10);
        assert!((t_max - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let ray = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb_line(&unit_box()).is_none());
    }

    #[test]
    fn test_ray_aabb_behind() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        // the box is behind the origin: negative parameters
        let (t_min, t_max) = ray.intersect_aabb_line(&unit_box()).unwrap();
        assert!((t_min + 6.0).abs() < 1e-10);
        assert!((t_max + 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_inside_aabb() {
        let ray = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.intersect_aabb_line(&unit_box()).unwrap();
        assert!((t_min + 0.5).abs() < 1e-10);
        assert!((t_max - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_sphere_test() {
        let ray = Ray::new(Point3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        assert!((ray.distance_to_point(&Point3::new(3.0, 4.0, 2.0)) - 5.0).abs() < 1e-12);
        assert!(ray.hits_sphere(&Point3::new(3.0, 4.0, 2.0), 5.0));
        assert!(!ray.hits_sphere(&Point3::new(3.0, 4.0, 2.0), 4.9));
        // behind the origin still counts
        assert!(ray.hits_sphere(&Point3::new(0.0, 0.0, -20.0), 0.1));
    }
}
