//! Expanding Polytope Algorithm for penetration depth and contacts.
//!
//! Starting from the origin-enclosing tetrahedron GJK terminates with, the
//! polytope grows toward the boundary of the Minkowski difference until the
//! closest face stops moving. That face's normal and distance are the
//! contact normal and penetration depth.

use glam::Vec3;
use log::debug;

use crate::{
    config::{
        CONTACT_FACE_TOLERANCE, EPA_EPSILON, EPA_MAX_ITERATIONS, MIN_CONTACT_SEPARATION,
    },
    geometry::{
        simplex::{Face, Simplex},
        traits::SupportMappable,
    },
    utils::math::normalize_or,
};

use super::{gjk::minkowski_support, CollisionResult};

/// Expands the terminal GJK simplex into penetration normal, depth, and
/// contact points.
///
/// Panics unless `simplex` holds a full tetrahedron; calling EPA without a
/// proven enclosure is caller misuse. Exhausting the iteration cap returns
/// the best boundary approximation found so far rather than failing.
pub fn penetration(
    a: &(impl SupportMappable + ?Sized),
    b: &(impl SupportMappable + ?Sized),
    simplex: &Simplex,
) -> CollisionResult {
    assert_eq!(
        simplex.len(),
        4,
        "EPA requires an origin-enclosing tetrahedron"
    );

    let mut vertices = vec![simplex[0], simplex[1], simplex[2], simplex[3]];
    let mut faces: Vec<Face> = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]]
        .into_iter()
        .filter_map(|indices| Face::new(&vertices, indices))
        .collect();

    if faces.is_empty() {
        // Flat tetrahedron; the shallowest vertex is the best boundary
        // estimate available.
        let closest = vertices
            .iter()
            .copied()
            .min_by(|p, q| {
                p.length_squared()
                    .partial_cmp(&q.length_squared())
                    .expect("finite support points")
            })
            .expect("four simplex vertices");
        return CollisionResult {
            colliding: true,
            normal: normalize_or(closest, Vec3::X),
            depth: closest.length(),
            contacts: vec![closest],
        };
    }

    for _ in 0..EPA_MAX_ITERATIONS {
        let best = closest_face(&faces);
        let support = minkowski_support(a, b, best.normal);
        let distance = support.dot(best.normal);

        if distance - best.distance < EPA_EPSILON {
            // The boundary is no farther than the face: converged.
            return finish(best, &faces);
        }

        if !expand(&mut vertices, &mut faces, support) || faces.is_empty() {
            return finish(best, &faces);
        }
    }

    debug!("epa: iteration cap reached, returning best approximation");
    let best = closest_face(&faces);
    finish(best, &faces)
}

fn closest_face(faces: &[Face]) -> Face {
    *faces
        .iter()
        .min_by(|p, q| {
            p.distance
                .partial_cmp(&q.distance)
                .expect("finite face distances")
        })
        .expect("polytope retains at least one face")
}

/// Assembles the result from the accepted face. Contact points are the
/// origin projected onto every boundary face within tolerance of the
/// accepted depth, spaced at least [`MIN_CONTACT_SEPARATION`] apart.
fn finish(best: Face, faces: &[Face]) -> CollisionResult {
    let mut contacts: Vec<Vec3> = Vec::new();
    for face in faces {
        if face.distance - best.distance <= CONTACT_FACE_TOLERANCE {
            let point = face.normal * face.distance;
            if contacts
                .iter()
                .all(|existing| existing.distance(point) > MIN_CONTACT_SEPARATION)
            {
                contacts.push(point);
            }
        }
    }

    CollisionResult {
        colliding: true,
        normal: best.normal,
        depth: best.distance,
        contacts,
    }
}

/// Inserts a support point into the polytope: faces that see the point are
/// torn out and the horizon of their removal is re-stitched to the new
/// vertex. Returns `false` when no face sees the point, which means the
/// polytope cannot grow any further.
fn expand(vertices: &mut Vec<Vec3>, faces: &mut Vec<Face>, support: Vec3) -> bool {
    let mut horizon: Vec<(usize, usize)> = Vec::new();
    let mut kept = Vec::with_capacity(faces.len());

    for face in faces.drain(..) {
        let visible = face.normal.dot(support - vertices[face.indices[0]]) > 0.0;
        if !visible {
            kept.push(face);
            continue;
        }

        let edges = [
            (face.indices[0], face.indices[1]),
            (face.indices[1], face.indices[2]),
            (face.indices[2], face.indices[0]),
        ];
        for (u, v) in edges {
            // An edge shared by two visible faces is interior and cancels
            // against its reversed twin; survivors form the horizon loop.
            if let Some(position) = horizon.iter().position(|&edge| edge == (v, u)) {
                horizon.remove(position);
            } else {
                horizon.push((u, v));
            }
        }
    }

    if horizon.is_empty() {
        *faces = kept;
        return false;
    }

    let new_index = vertices.len();
    vertices.push(support);
    for (u, v) in horizon {
        if let Some(face) = Face::new(vertices, [u, v, new_index]) {
            kept.push(face);
        }
    }
    *faces = kept;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrowphase::gjk::{self, GjkResult};
    use crate::shapes::{Cuboid, Sphere};

    fn run_epa(
        a: &(impl SupportMappable + ?Sized),
        b: &(impl SupportMappable + ?Sized),
    ) -> CollisionResult {
        match gjk::test(a, b) {
            GjkResult::Overlapping(simplex) => penetration(a, b, &simplex),
            GjkResult::Separated => panic!("pair must overlap for EPA"),
        }
    }

    #[test]
    fn offset_unit_cubes_report_face_normal_and_depth() {
        let a = Cuboid::axis_aligned(Vec3::ZERO, Vec3::splat(0.5));
        let b = Cuboid::axis_aligned(Vec3::new(0.5, 0.0, 0.0), Vec3::splat(0.5));

        let result = run_epa(&a, &b);
        assert!(result.colliding);
        assert!((result.depth - 0.5).abs() < 1e-3, "depth was {}", result.depth);
        assert!(
            result.normal.x.abs() > 0.99,
            "normal was {:?}",
            result.normal
        );
        assert!(result.normal.y.abs() < 1e-3);
        assert!(result.normal.z.abs() < 1e-3);
        assert!(!result.contacts.is_empty());
    }

    #[test]
    fn overlapping_spheres_report_center_axis_depth() {
        let a = Sphere::new(Vec3::ZERO, 1.0);
        let b = Sphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);

        let result = run_epa(&a, &b);
        // Exact depth is 0.5; the polytope inscribes the sphere pair so a
        // small undershoot is expected.
        assert!(
            result.depth > 0.4 && result.depth < 0.55,
            "depth was {}",
            result.depth
        );
        assert!(result.normal.x.abs() > 0.95);
    }

    #[test]
    fn result_normal_is_unit_length() {
        let a = Sphere::new(Vec3::new(0.2, -0.1, 0.4), 1.2);
        let b = Sphere::new(Vec3::new(1.0, 0.5, 0.0), 1.0);

        let result = run_epa(&a, &b);
        assert!(result.colliding);
        assert!(result.depth > 0.0);
        assert!((result.normal.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn duplicate_contacts_are_filtered() {
        let a = Cuboid::axis_aligned(Vec3::ZERO, Vec3::splat(0.5));
        let b = Cuboid::axis_aligned(Vec3::new(0.25, 0.0, 0.0), Vec3::splat(0.5));

        let result = run_epa(&a, &b);
        for (i, p) in result.contacts.iter().enumerate() {
            for q in &result.contacts[i + 1..] {
                assert!(p.distance(*q) > MIN_CONTACT_SEPARATION);
            }
        }
    }

    #[test]
    #[should_panic(expected = "origin-enclosing tetrahedron")]
    fn sub_rank_simplex_is_rejected() {
        let a = Sphere::new(Vec3::ZERO, 1.0);
        let b = Sphere::new(Vec3::new(0.5, 0.0, 0.0), 1.0);
        let simplex = Simplex::from_slice(&[Vec3::X, Vec3::Y]);
        let _ = penetration(&a, &b, &simplex);
    }
}
