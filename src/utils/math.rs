//! Math helpers layered on top of `glam`.

use glam::Vec3;

use crate::config::GEOMETRIC_EPSILON;

/// Normalizes `v`, substituting `fallback` when the length is degenerate.
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let length_squared = v.length_squared();
    if length_squared > GEOMETRIC_EPSILON {
        v / length_squared.sqrt()
    } else {
        fallback
    }
}

/// Returns a vector perpendicular to `v`, chosen against the basis axis `v`
/// is least aligned with.
pub fn any_perpendicular(v: Vec3) -> Vec3 {
    let x = v.x.abs();
    let y = v.y.abs();
    let z = v.z.abs();
    let axis = if x <= y && x <= z {
        Vec3::X
    } else if y <= z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    v.cross(axis)
}
