//! Impactor – convex collision detection for Rust.
//!
//! The crate is split the way a detection tick flows: interchangeable
//! broad-phase indices (a bounded-leaf BVH and sweep-and-prune) narrow all
//! registered shapes down to candidate pairs, and narrow-phase solvers (GJK
//! for the boolean test, EPA for penetration depth and contacts, SAT for
//! polytope-like shapes) resolve each candidate exactly. Shapes plug in
//! through small capability traits; [`CollisionWorld`] wires both phases
//! together for callers that want the full pipeline.

pub mod broadphase;
pub mod config;
pub mod geometry;
pub mod narrowphase;
pub mod shapes;
pub mod utils;
pub mod world;

pub use glam::{Quat, Vec3};

pub use broadphase::{BroadPhase, Bvh, CandidatePair, Proxy, ProxyId, SweepAndPrune};
pub use geometry::{
    bounds::{Aabb, Ray},
    interval::Interval,
    simplex::{Face, Simplex},
    traits::{AxisProjectable, Boundable, SupportMappable},
};
pub use narrowphase::{collide, intersects, CollisionResult, GjkResult};
pub use shapes::{ConvexPolyhedron, Cuboid, Shape, Sphere};
pub use utils::allocator::{Arena, ShapeId, SlotId};
pub use world::{BroadPhaseKind, CollisionWorld, ContactEvent};
