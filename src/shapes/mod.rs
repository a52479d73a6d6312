//! Reference shape implementations of the geometry capability traits.
//!
//! The collision core itself is generic over [`Boundable`],
//! [`SupportMappable`], and [`AxisProjectable`]; these shapes are the
//! concrete implementations used by the dispatcher, the world, and the test
//! suite. Callers with their own geometry only need to implement the traits.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    geometry::{
        bounds::Aabb,
        interval::Interval,
        traits::{AxisProjectable, Boundable, SupportMappable},
    },
    utils::math::normalize_or,
};

/// Sphere positioned in world space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Boundable for Sphere {
    fn bounding_box(&self) -> Aabb {
        Aabb::from_center_extents(self.center, Vec3::splat(self.radius))
    }
}

impl SupportMappable for Sphere {
    fn support(&self, direction: Vec3) -> Vec3 {
        self.center + normalize_or(direction, Vec3::X) * self.radius
    }
}

/// Oriented box described by center, rotation, and half extents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cuboid {
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
}

impl Cuboid {
    pub fn new(center: Vec3, rotation: Quat, half_extents: Vec3) -> Self {
        Self {
            center,
            rotation,
            half_extents,
        }
    }

    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, Quat::IDENTITY, half_extents)
    }

    /// World-space directions of the three local basis axes.
    fn local_axes(&self) -> [Vec3; 3] {
        let m = Mat3::from_quat(self.rotation);
        [m.x_axis, m.y_axis, m.z_axis]
    }

    /// Half-projection of the box onto a unit axis.
    fn extent_along(&self, axis: Vec3) -> f32 {
        let [x, y, z] = self.local_axes();
        x.dot(axis).abs() * self.half_extents.x
            + y.dot(axis).abs() * self.half_extents.y
            + z.dot(axis).abs() * self.half_extents.z
    }
}

impl Boundable for Cuboid {
    fn bounding_box(&self) -> Aabb {
        let m = Mat3::from_quat(self.rotation);
        let extents = m.x_axis.abs() * self.half_extents.x
            + m.y_axis.abs() * self.half_extents.y
            + m.z_axis.abs() * self.half_extents.z;
        Aabb::from_center_extents(self.center, extents)
    }
}

impl SupportMappable for Cuboid {
    fn support(&self, direction: Vec3) -> Vec3 {
        let local_dir = self.rotation.conjugate() * direction;
        let local = Vec3::new(
            self.half_extents.x.copysign(local_dir.x),
            self.half_extents.y.copysign(local_dir.y),
            self.half_extents.z.copysign(local_dir.z),
        );
        self.center + self.rotation * local
    }
}

impl AxisProjectable for Cuboid {
    fn axes(&self) -> Vec<Vec3> {
        self.local_axes().to_vec()
    }

    fn project(&self, axis: Vec3) -> Interval {
        let mid = self.center.dot(axis);
        let extent = self.extent_along(axis);
        Interval::new(mid - extent, mid + extent)
    }
}

/// Convex hull described by its world-space vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvexPolyhedron {
    pub points: Vec<Vec3>,
}

impl ConvexPolyhedron {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }
}

impl Boundable for ConvexPolyhedron {
    fn bounding_box(&self) -> Aabb {
        let first = self.points.first().copied().unwrap_or(Vec3::ZERO);
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
        Aabb::new(min, max)
    }
}

impl SupportMappable for ConvexPolyhedron {
    fn support(&self, direction: Vec3) -> Vec3 {
        let mut best_point = Vec3::ZERO;
        let mut best_dot = f32::MIN;
        for &p in &self.points {
            let dot = p.dot(direction);
            if dot > best_dot {
                best_dot = dot;
                best_point = p;
            }
        }
        best_point
    }
}

/// Concrete shape union dispatched by [`crate::narrowphase::collide`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Sphere(Sphere),
    Cuboid(Cuboid),
    ConvexPolyhedron(ConvexPolyhedron),
}

impl Shape {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere(Sphere::new(center, radius))
    }

    pub fn cuboid(center: Vec3, rotation: Quat, half_extents: Vec3) -> Self {
        Shape::Cuboid(Cuboid::new(center, rotation, half_extents))
    }

    pub fn aligned_cuboid(center: Vec3, half_extents: Vec3) -> Self {
        Shape::Cuboid(Cuboid::axis_aligned(center, half_extents))
    }

    pub fn polyhedron(points: Vec<Vec3>) -> Self {
        Shape::ConvexPolyhedron(ConvexPolyhedron::new(points))
    }
}

impl Boundable for Shape {
    fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bounding_box(),
            Shape::Cuboid(c) => c.bounding_box(),
            Shape::ConvexPolyhedron(p) => p.bounding_box(),
        }
    }
}

impl SupportMappable for Shape {
    fn support(&self, direction: Vec3) -> Vec3 {
        match self {
            Shape::Sphere(s) => s.support(direction),
            Shape::Cuboid(c) => c.support(direction),
            Shape::ConvexPolyhedron(p) => p.support(direction),
        }
    }
}
