//! Narrow-phase solvers resolving candidate pairs into exact results.

pub mod epa;
pub mod gjk;
pub mod sat;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::traits::Boundable,
    shapes::Shape,
};

pub use gjk::GjkResult;

/// Outcome of a narrow-phase query. `normal` is unit length and `depth`
/// positive when the shapes collide; `contacts` is empty otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    pub colliding: bool,
    pub normal: Vec3,
    pub depth: f32,
    pub contacts: Vec<Vec3>,
}

impl CollisionResult {
    /// Canonical miss value.
    pub fn separated() -> Self {
        Self {
            colliding: false,
            normal: Vec3::ZERO,
            depth: 0.0,
            contacts: Vec::new(),
        }
    }
}

/// Resolves a shape pair with the solver suited to its capabilities:
/// cuboid pairs carry complete axis sets and go through SAT, everything
/// else through GJK with EPA for penetration data.
///
/// The returned normal points from `a` toward `b`.
pub fn collide(a: &Shape, b: &Shape) -> CollisionResult {
    let mut result = match (a, b) {
        (Shape::Cuboid(cuboid_a), Shape::Cuboid(cuboid_b)) => sat::collide(cuboid_a, cuboid_b),
        _ => match gjk::test(a, b) {
            GjkResult::Separated => CollisionResult::separated(),
            GjkResult::Overlapping(simplex) => epa::penetration(a, b, &simplex),
        },
    };

    if result.colliding {
        let toward_b = b.bounding_box().center() - a.bounding_box().center();
        if result.normal.dot(toward_b) < 0.0 {
            result.normal = -result.normal;
        }
    }
    result
}

/// Boolean-only variant of [`collide`].
pub fn intersects(a: &Shape, b: &Shape) -> bool {
    match (a, b) {
        (Shape::Cuboid(cuboid_a), Shape::Cuboid(cuboid_b)) => {
            sat::intersect(cuboid_a, cuboid_b)
        }
        _ => gjk::intersect(a, b),
    }
}
