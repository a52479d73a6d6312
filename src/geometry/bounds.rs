use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::GEOMETRIC_EPSILON;

/// Axis-aligned bounding box. `min` is componentwise below `max`; the
/// constructor normalizes swapped corners so the invariant always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index (0 = x, 1 = y, 2 = z) of the widest extent.
    pub fn longest_axis(&self) -> usize {
        let e = self.extents();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn surface_area(&self) -> f32 {
        let e = self.extents();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    /// Slab test returning the entry distance along `ray`, or `None` when the
    /// ray misses the box within its range.
    pub fn ray_intersection(&self, ray: &Ray) -> Option<f32> {
        let direction = ray.direction.normalize_or_zero();
        if direction.length_squared() < GEOMETRIC_EPSILON {
            return None;
        }

        let mut t_min = 0.0f32;
        let mut t_max = ray.max_distance;

        for i in 0..3 {
            let origin = ray.origin[i];
            let dir = direction[i];

            if dir.abs() < GEOMETRIC_EPSILON {
                if origin < self.min[i] || origin > self.max[i] {
                    return None;
                }
            } else {
                let inv = 1.0 / dir;
                let mut t1 = (self.min[i] - origin) * inv;
                let mut t2 = (self.max[i] - origin) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        Some(t_min)
    }
}

/// Ray with a bounded reach, used by broad-phase ray queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_normalizes_swapped_corners() {
        let aabb = Aabb::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::ONE);
    }

    #[test]
    fn union_covers_both_boxes() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(2.0, -1.0, 0.5), Vec3::new(3.0, 0.5, 2.0));
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(u.max, Vec3::new(3.0, 1.0, 2.0));
    }

    #[test]
    fn overlap_includes_touching_faces() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(1.1, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn longest_axis_tracks_widest_extent() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 5.0, 2.0));
        assert_eq!(aabb.longest_axis(), 1);
    }

    #[test]
    fn contains_point_is_inclusive_of_faces() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.contains_point(Vec3::ONE));
        assert!(!aabb.contains_point(Vec3::new(1.1, 0.5, 0.5)));
    }

    #[test]
    fn ray_hits_box_in_front_of_origin() {
        let aabb = Aabb::new(Vec3::new(2.0, -0.5, -0.5), Vec3::new(3.0, 0.5, 0.5));
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 10.0);
        let t = aabb.ray_intersection(&ray).expect("ray should hit");
        assert!((t - 2.0).abs() < 1e-5);

        let miss = Ray::new(Vec3::ZERO, Vec3::Y, 10.0);
        assert!(aabb.ray_intersection(&miss).is_none());
    }

    #[test]
    fn ray_range_limits_hits() {
        let aabb = Aabb::new(Vec3::new(5.0, -0.5, -0.5), Vec3::new(6.0, 0.5, 0.5));
        let short = Ray::new(Vec3::ZERO, Vec3::X, 2.0);
        assert!(aabb.ray_intersection(&short).is_none());
    }
}
