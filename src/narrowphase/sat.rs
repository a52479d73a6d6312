//! Separating axis test over projected intervals.
//!
//! Exact for shape classes whose axis sets are complete (boxes, polytopes):
//! two convex shapes are disjoint exactly when some face normal or edge
//! cross product separates their projections.

use glam::Vec3;

use crate::{
    config::GEOMETRIC_EPSILON,
    geometry::traits::{AxisProjectable, Boundable},
};

use super::CollisionResult;

/// Candidate axis set: both shapes' own axes plus the normalized cross
/// products of every axis combination. Near-parallel combinations produce
/// degenerate crosses and are skipped.
fn candidate_axes(
    a: &(impl AxisProjectable + ?Sized),
    b: &(impl AxisProjectable + ?Sized),
) -> Vec<Vec3> {
    let axes_a = a.axes();
    let axes_b = b.axes();

    let mut axes = Vec::with_capacity(axes_a.len() + axes_b.len() + axes_a.len() * axes_b.len());
    axes.extend_from_slice(&axes_a);
    axes.extend_from_slice(&axes_b);

    for &axis_a in &axes_a {
        for &axis_b in &axes_b {
            let cross = axis_a.cross(axis_b);
            if cross.length_squared() > GEOMETRIC_EPSILON {
                axes.push(cross.normalize());
            }
        }
    }

    axes
}

/// Boolean separating-axis test: any axis with disjoint projections proves
/// separation; no separating axis in a complete set proves overlap.
pub fn intersect(
    a: &(impl AxisProjectable + ?Sized),
    b: &(impl AxisProjectable + ?Sized),
) -> bool {
    candidate_axes(a, b)
        .into_iter()
        .all(|axis| a.project(axis).overlaps(&b.project(axis)))
}

/// Overlap-minimization variant: keeps the axis of smallest positive
/// overlap as the contact normal and that overlap as the depth. The two
/// contact points are the shapes' centroids brought together by half the
/// depth along the normal. The normal points from `a` toward `b`.
pub fn collide<A, B>(a: &A, b: &B) -> CollisionResult
where
    A: AxisProjectable + Boundable + ?Sized,
    B: AxisProjectable + Boundable + ?Sized,
{
    let axes = candidate_axes(a, b);
    if axes.is_empty() {
        // Without candidate axes no overlap evidence exists; report a miss
        // rather than inventing a normal.
        return CollisionResult::separated();
    }

    let mut min_depth = f32::MAX;
    let mut min_axis = Vec3::ZERO;

    for axis in axes {
        let overlap = a.project(axis).penetration(&b.project(axis));
        if overlap <= 0.0 {
            return CollisionResult::separated();
        }
        if overlap < min_depth {
            min_depth = overlap;
            min_axis = axis;
        }
    }

    let center_a = a.bounding_box().center();
    let center_b = b.bounding_box().center();
    let normal = if min_axis.dot(center_b - center_a) < 0.0 {
        -min_axis
    } else {
        min_axis
    };

    let contacts = vec![
        center_a + normal * (min_depth * 0.5),
        center_b - normal * (min_depth * 0.5),
    ];

    CollisionResult {
        colliding: true,
        normal,
        depth: min_depth,
        contacts,
    }
}
