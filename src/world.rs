use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    broadphase::{BroadPhase, Bvh, ProxyId, SweepAndPrune},
    geometry::{
        bounds::{Aabb, Ray},
        traits::Boundable,
    },
    narrowphase::{self, CollisionResult},
    shapes::Shape,
    utils::{
        allocator::{Arena, ShapeId},
        logging::ScopedTimer,
    },
};

/// Broad-phase implementation selector for a collision world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadPhaseKind {
    Bvh,
    SweepAndPrune,
}

/// Contact event between two registered shapes.
#[derive(Debug, Clone)]
pub struct ContactEvent {
    pub a: ShapeId,
    pub b: ShapeId,
    pub result: CollisionResult,
}

/// Explicit collision context owning shapes and one broad-phase index.
///
/// Worlds are plain values with no process-wide state behind them, so any
/// number can coexist: separate scenes, parallel test cases, or a BVH world
/// cross-checked against a sweep-and-prune world.
pub struct CollisionWorld {
    shapes: Arena<Shape>,
    broadphase: Box<dyn BroadPhase + Send + Sync>,
    proxy_of: HashMap<ShapeId, ProxyId>,
    parallel_enabled: bool,
}

impl CollisionWorld {
    pub fn new(kind: BroadPhaseKind) -> Self {
        let broadphase: Box<dyn BroadPhase + Send + Sync> = match kind {
            BroadPhaseKind::Bvh => Box::new(Bvh::new()),
            BroadPhaseKind::SweepAndPrune => Box::new(SweepAndPrune::new()),
        };
        Self {
            shapes: Arena::new(),
            broadphase,
            proxy_of: HashMap::new(),
            parallel_enabled: cfg!(feature = "parallel"),
        }
    }

    /// Registers a shape and indexes its bounding box.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let aabb = shape.bounding_box();
        let id = self.shapes.insert(shape);
        let proxy = self.broadphase.insert(id, aabb);
        self.proxy_of.insert(id, proxy);
        id
    }

    /// Unregisters a shape, returning it. Panics on an unknown id.
    pub fn remove_shape(&mut self, id: ShapeId) -> Shape {
        let proxy = self.proxy_of.remove(&id).expect("unknown shape id");
        self.broadphase.remove(proxy);
        self.shapes.remove(id).expect("shape for live proxy")
    }

    /// Mutates a shape in place and re-indexes its bounding box.
    pub fn update_shape(&mut self, id: ShapeId, mutate: impl FnOnce(&mut Shape)) {
        let shape = self.shapes.get_mut(id).expect("unknown shape id");
        mutate(shape);
        let aabb = shape.bounding_box();
        let proxy = self.proxy_of[&id];
        self.broadphase.update(proxy, aabb);
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn shape_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.shapes.ids()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn clear(&mut self) {
        self.shapes = Arena::new();
        self.broadphase.clear();
        self.proxy_of.clear();
    }

    /// Enables or disables fanning the narrow phase out over worker threads.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    /// Runs one full detection pass: broad-phase candidates, then the narrow
    /// phase per pair. Only colliding pairs are reported.
    pub fn detect(&self) -> Vec<ContactEvent> {
        let _timer = ScopedTimer::new("collision_world.detect");

        let candidates: Vec<(ShapeId, ShapeId)> = self
            .broadphase
            .query_pairs()
            .into_iter()
            .map(|pair| {
                let (proxy_a, proxy_b) = pair.proxies();
                let a = self.broadphase.proxy(proxy_a).expect("paired proxy").shape;
                let b = self.broadphase.proxy(proxy_b).expect("paired proxy").shape;
                (a, b)
            })
            .collect();

        let shapes = &self.shapes;
        let narrow = |&(id_a, id_b): &(ShapeId, ShapeId)| -> Option<ContactEvent> {
            let a = shapes.get(id_a).expect("shape for live proxy");
            let b = shapes.get(id_b).expect("shape for live proxy");
            let result = narrowphase::collide(a, b);
            result.colliding.then(|| ContactEvent {
                a: id_a,
                b: id_b,
                result,
            })
        };

        #[cfg(feature = "parallel")]
        if self.parallel_enabled {
            return candidates.par_iter().filter_map(narrow).collect();
        }

        candidates.iter().filter_map(narrow).collect()
    }

    /// Shapes whose bounding boxes overlap the query box.
    pub fn query_aabb(&self, aabb: &Aabb) -> Vec<ShapeId> {
        self.broadphase
            .query_aabb(aabb)
            .into_iter()
            .map(|proxy| self.broadphase.proxy(proxy).expect("queried proxy").shape)
            .collect()
    }

    /// Shapes whose bounding boxes the ray hits within its range.
    pub fn query_ray(&self, ray: &Ray) -> Vec<ShapeId> {
        self.broadphase
            .query_ray(ray)
            .into_iter()
            .map(|proxy| self.broadphase.proxy(proxy).expect("queried proxy").shape)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn detect_reports_only_colliding_pairs() {
        let mut world = CollisionWorld::new(BroadPhaseKind::Bvh);
        let a = world.add_shape(Shape::sphere(Vec3::ZERO, 1.0));
        let b = world.add_shape(Shape::sphere(Vec3::new(1.5, 0.0, 0.0), 1.0));
        let _far = world.add_shape(Shape::sphere(Vec3::new(10.0, 0.0, 0.0), 1.0));

        let events = world.detect();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert!(event.a == a && event.b == b || event.a == b && event.b == a);
        assert!(event.result.depth > 0.0);
    }

    #[test]
    fn update_shape_moves_its_proxy() {
        let mut world = CollisionWorld::new(BroadPhaseKind::SweepAndPrune);
        let a = world.add_shape(Shape::sphere(Vec3::ZERO, 1.0));
        world.add_shape(Shape::sphere(Vec3::new(10.0, 0.0, 0.0), 1.0));
        assert!(world.detect().is_empty());

        world.update_shape(a, |shape| {
            if let Shape::Sphere(sphere) = shape {
                sphere.center = Vec3::new(9.0, 0.0, 0.0);
            }
        });
        assert_eq!(world.detect().len(), 1);
    }

    #[test]
    fn removed_shapes_stop_colliding() {
        let mut world = CollisionWorld::new(BroadPhaseKind::Bvh);
        let a = world.add_shape(Shape::sphere(Vec3::ZERO, 1.0));
        world.add_shape(Shape::sphere(Vec3::new(1.0, 0.0, 0.0), 1.0));
        assert_eq!(world.detect().len(), 1);

        world.remove_shape(a);
        assert!(world.detect().is_empty());
        assert_eq!(world.len(), 1);
    }
}
