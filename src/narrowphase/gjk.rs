//! Gilbert-Johnson-Keerthi boolean overlap test.
//!
//! Walks a simplex through Minkowski-difference space toward the origin.
//! The origin lies inside the difference exactly when the shapes overlap;
//! a support point that fails to pass the origin proves a separating axis.

use glam::Vec3;

use crate::{
    config::{GEOMETRIC_EPSILON, GJK_MAX_ITERATIONS},
    geometry::{simplex::Simplex, traits::SupportMappable},
    utils::math::any_perpendicular,
};

/// Terminal state of a GJK run. The overlapping variant carries the
/// origin-enclosing tetrahedron EPA expands from.
#[derive(Debug, Clone)]
pub enum GjkResult {
    Separated,
    Overlapping(Simplex),
}

/// Support point of the Minkowski difference `a − b` along `direction`.
pub(crate) fn minkowski_support(
    a: &(impl SupportMappable + ?Sized),
    b: &(impl SupportMappable + ?Sized),
    direction: Vec3,
) -> Vec3 {
    a.support(direction) - b.support(-direction)
}

/// Boolean overlap test.
pub fn intersect(a: &(impl SupportMappable + ?Sized), b: &(impl SupportMappable + ?Sized)) -> bool {
    matches!(test(a, b), GjkResult::Overlapping(_))
}

/// Full test returning the terminal simplex on overlap.
///
/// Exhausting the iteration cap reports separation, keeping worst-case
/// latency bounded under floating-point cycling.
pub fn test(
    a: &(impl SupportMappable + ?Sized),
    b: &(impl SupportMappable + ?Sized),
) -> GjkResult {
    let mut simplex = Simplex::new();

    let first = minkowski_support(a, b, Vec3::X);
    simplex.push_front(first);

    let mut direction = -first;
    if direction.length_squared() < GEOMETRIC_EPSILON {
        // The first support landed on the origin; probe off-axis.
        direction = Vec3::Y;
    }

    for _ in 0..GJK_MAX_ITERATIONS {
        let point = minkowski_support(a, b, direction);
        if point.dot(direction) < 0.0 {
            // The difference never reaches past the origin along this
            // direction: a separating axis.
            return GjkResult::Separated;
        }

        simplex.push_front(point);
        if advance(&mut simplex, &mut direction) {
            return GjkResult::Overlapping(simplex);
        }
    }

    GjkResult::Separated
}

/// Reduces the simplex to the feature closest to the origin and picks the
/// next search direction. Returns `true` when a tetrahedron encloses the
/// origin.
fn advance(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    match simplex.len() {
        2 => {
            segment(simplex, direction);
            false
        }
        3 => {
            triangle(simplex, direction);
            false
        }
        4 => tetrahedron(simplex, direction),
        rank => unreachable!("GJK simplex cannot have rank {rank}"),
    }
}

fn segment(simplex: &mut Simplex, direction: &mut Vec3) {
    let a = simplex[0];
    let b = simplex[1];
    let ab = b - a;
    let ao = -a;

    if ab.dot(ao) > 0.0 {
        let perpendicular = ab.cross(ao).cross(ab);
        *direction = if perpendicular.length_squared() < GEOMETRIC_EPSILON {
            // Origin sits on the segment's line.
            any_perpendicular(ab)
        } else {
            perpendicular
        };
    } else {
        *simplex = Simplex::from_slice(&[a]);
        *direction = ao;
    }
}

fn triangle(simplex: &mut Simplex, direction: &mut Vec3) {
    let a = simplex[0];
    let b = simplex[1];
    let c = simplex[2];
    let ab = b - a;
    let ac = c - a;
    let ao = -a;
    let abc = ab.cross(ac);

    if abc.cross(ac).dot(ao) > 0.0 {
        // Origin beyond the AC edge.
        *simplex = Simplex::from_slice(&[a, c]);
        let perpendicular = ac.cross(ao).cross(ac);
        *direction = if perpendicular.length_squared() < GEOMETRIC_EPSILON {
            any_perpendicular(ac)
        } else {
            perpendicular
        };
    } else if ab.cross(abc).dot(ao) > 0.0 {
        // Origin beyond the AB edge.
        *simplex = Simplex::from_slice(&[a, b]);
        let perpendicular = ab.cross(ao).cross(ab);
        *direction = if perpendicular.length_squared() < GEOMETRIC_EPSILON {
            any_perpendicular(ab)
        } else {
            perpendicular
        };
    } else if abc.length_squared() < GEOMETRIC_EPSILON {
        // Degenerate sliver; restart off-plane.
        *direction = any_perpendicular(ab);
    } else if abc.dot(ao) > 0.0 {
        *direction = abc;
    } else {
        // Keep the winding consistent for the tetrahedron case: the newest
        // point must see the triangle's front face.
        *simplex = Simplex::from_slice(&[a, c, b]);
        *direction = -abc;
    }
}

/// Tests the three faces adjacent to the newest point. The base triangle was
/// already validated when the previous iteration chose its direction.
fn tetrahedron(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let a = simplex[0];
    let b = simplex[1];
    let c = simplex[2];
    let d = simplex[3];
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let ao = -a;

    let abc = ab.cross(ac);
    let acd = ac.cross(ad);
    let adb = ad.cross(ab);

    if abc.dot(ao) > 0.0 {
        *simplex = Simplex::from_slice(&[a, b, c]);
        *direction = abc;
        false
    } else if acd.dot(ao) > 0.0 {
        *simplex = Simplex::from_slice(&[a, c, d]);
        *direction = acd;
        false
    } else if adb.dot(ao) > 0.0 {
        *simplex = Simplex::from_slice(&[a, d, b]);
        *direction = adb;
        false
    } else {
        true
    }
}
