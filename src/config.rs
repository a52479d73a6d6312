//! Tuning constants for the collision pipeline.

/// Maximum number of proxies a BVH leaf may hold before it splits.
pub const MAX_LEAF_OBJECTS: usize = 10;

/// Iteration cap for the GJK simplex refinement loop.
pub const GJK_MAX_ITERATIONS: usize = 32;

/// Iteration cap for EPA polytope expansion.
pub const EPA_MAX_ITERATIONS: usize = 50;

/// Expansion threshold below which EPA considers the polytope converged.
pub const EPA_EPSILON: f32 = 1e-4;

/// Faces within this distance of the minimum contribute contact points.
pub const CONTACT_FACE_TOLERANCE: f32 = 1e-3;

/// Minimum spacing between two reported contact points.
pub const MIN_CONTACT_SEPARATION: f32 = 1e-3;

/// Squared-length guard below which vectors are treated as degenerate.
pub const GEOMETRIC_EPSILON: f32 = 1e-6;
