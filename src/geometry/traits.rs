//! Capability contracts implemented by shapes consumed by the collision core.

use glam::Vec3;

use super::{bounds::Aabb, interval::Interval};

/// Shapes that can report a world-space axis-aligned bounding box.
pub trait Boundable {
    fn bounding_box(&self) -> Aabb;
}

/// Convex shapes exposing a GJK support mapping: the farthest point of the
/// shape along a given direction.
pub trait SupportMappable {
    fn support(&self, direction: Vec3) -> Vec3;
}

/// Shapes that enumerate candidate separating axes and project themselves
/// onto a probe axis. SAT is exact only when the axis set is complete for
/// the shape class (true for boxes and polytopes).
pub trait AxisProjectable {
    fn axes(&self) -> Vec<Vec3>;
    fn project(&self, axis: Vec3) -> Interval;
}
