use glam::Vec3;

use crate::config::GEOMETRIC_EPSILON;

/// Ordered set of up to four points in Minkowski-difference space, newest
/// first. GJK grows it one support point at a time and reduces it whenever a
/// Voronoi test discards a region.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplex {
    points: [Vec3; 4],
    len: usize,
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(points: &[Vec3]) -> Self {
        assert!(points.len() <= 4, "simplex holds at most four points");
        let mut simplex = Self::new();
        for &p in points {
            simplex.points[simplex.len] = p;
            simplex.len += 1;
        }
        simplex
    }

    /// Prepends a point, making it the newest entry at index 0.
    pub fn push_front(&mut self, point: Vec3) {
        debug_assert!(self.len < 4, "pushing into a full simplex");
        let mut i = self.len.min(3);
        while i > 0 {
            self.points[i] = self.points[i - 1];
            i -= 1;
        }
        self.points[0] = point;
        self.len = (self.len + 1).min(4);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::ops::Index<usize> for Simplex {
    type Output = Vec3;

    fn index(&self, index: usize) -> &Vec3 {
        assert!(index < self.len, "simplex index {index} out of rank {}", self.len);
        &self.points[index]
    }
}

/// Triangular facet of the EPA polytope: three vertex indices, a unit
/// outward normal, and the plane distance from the origin (sign corrected so
/// the distance is never negative).
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub indices: [usize; 3],
    pub normal: Vec3,
    pub distance: f32,
}

impl Face {
    /// Builds the facet over three polytope vertices. Returns `None` for a
    /// degenerate (near zero-area) triangle.
    ///
    /// The winding is corrected alongside the normal sign, so stored faces
    /// are always counter-clockwise seen from outside; adjacent faces then
    /// traverse a shared edge in opposite directions, which the EPA horizon
    /// walk relies on.
    pub fn new(vertices: &[Vec3], mut indices: [usize; 3]) -> Option<Face> {
        let a = vertices[indices[0]];
        let b = vertices[indices[1]];
        let c = vertices[indices[2]];

        let cross = (b - a).cross(c - a);
        if cross.length_squared() < GEOMETRIC_EPSILON {
            return None;
        }

        let mut normal = cross.normalize();
        let mut distance = a.dot(normal);
        if distance < 0.0 {
            normal = -normal;
            distance = -distance;
            indices.swap(1, 2);
        }

        Some(Face {
            indices,
            normal,
            distance,
        })
    }
}
