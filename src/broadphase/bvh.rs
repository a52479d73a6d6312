use std::collections::HashMap;

use log::debug;

use crate::{
    config::MAX_LEAF_OBJECTS,
    geometry::bounds::{Aabb, Ray},
    utils::allocator::{Arena, ShapeId},
};

use super::{BroadPhase, CandidatePair, Proxy, ProxyId};

const NULL_NODE: u32 = u32::MAX;

/// Arena-indexed tree node. Children are vector indices rather than owned
/// boxes, and every node carries a parent link so removal never re-walks
/// from the root.
#[derive(Debug, Clone)]
struct Node {
    aabb: Aabb,
    parent: u32,
    left: u32,
    right: u32,
    /// Proxy ids held by a leaf; always empty on internal nodes.
    items: Vec<ProxyId>,
}

impl Node {
    fn leaf(parent: u32, aabb: Aabb, items: Vec<ProxyId>) -> Self {
        Self {
            aabb,
            parent,
            left: NULL_NODE,
            right: NULL_NODE,
            items,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left == NULL_NODE
    }
}

/// Bounding volume hierarchy with bounded leaves.
///
/// Leaves hold up to [`MAX_LEAF_OBJECTS`] proxies and split on their longest
/// axis when they overflow. Internal nodes always have exactly two children
/// and a bound equal to the union of the children's bounds.
#[derive(Debug, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    free: Vec<u32>,
    root: Option<u32>,
    proxies: Arena<Proxy>,
    leaf_of: HashMap<ProxyId, u32>,
}

impl Bvh {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            proxies: Arena::new(),
            leaf_of: HashMap::new(),
        }
    }

    fn alloc_node(&mut self, node: Node) -> u32 {
        if let Some(index) = self.free.pop() {
            self.nodes[index as usize] = node;
            index
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(node);
            index
        }
    }

    fn free_node(&mut self, index: u32) {
        self.nodes[index as usize].items.clear();
        self.free.push(index);
    }

    fn bounds_of(&self, items: &[ProxyId]) -> Aabb {
        let mut iter = items.iter();
        let first = iter.next().expect("bounds of an empty item list");
        let mut aabb = self.proxies.get(*first).expect("live proxy").aabb;
        for &id in iter {
            aabb = aabb.union(&self.proxies.get(id).expect("live proxy").aabb);
        }
        aabb
    }

    /// Re-merges bounds from `start` up to the root.
    fn refit_from(&mut self, start: u32) {
        let mut index = start;
        while index != NULL_NODE {
            let merged = {
                let node = &self.nodes[index as usize];
                if node.is_leaf() {
                    if node.items.is_empty() {
                        node.aabb
                    } else {
                        self.bounds_of(&node.items)
                    }
                } else {
                    let left = &self.nodes[node.left as usize];
                    let right = &self.nodes[node.right as usize];
                    left.aabb.union(&right.aabb)
                }
            };
            self.nodes[index as usize].aabb = merged;
            index = self.nodes[index as usize].parent;
        }
    }

    /// Descends to the leaf whose bound grows least and appends the proxy,
    /// splitting the leaf if it overflows.
    fn insert_into_tree(&mut self, id: ProxyId) {
        let aabb = self.proxies.get(id).expect("live proxy").aabb;

        let root = match self.root {
            Some(root) => root,
            None => {
                let node = self.alloc_node(Node::leaf(NULL_NODE, aabb, vec![id]));
                self.root = Some(node);
                self.leaf_of.insert(id, node);
                return;
            }
        };

        let mut index = root;
        while !self.nodes[index as usize].is_leaf() {
            let growth = |child: u32| {
                let child_aabb = self.nodes[child as usize].aabb;
                child_aabb.union(&aabb).surface_area() - child_aabb.surface_area()
            };
            let left = self.nodes[index as usize].left;
            let right = self.nodes[index as usize].right;
            index = if growth(left) <= growth(right) {
                left
            } else {
                right
            };
        }

        self.nodes[index as usize].items.push(id);
        self.leaf_of.insert(id, index);
        self.refit_from(index);

        if self.nodes[index as usize].items.len() > MAX_LEAF_OBJECTS {
            self.split_leaf(index);
        }
    }

    /// Partitions an overflowing leaf along its longest axis, comparing each
    /// proxy's center against the leaf bound's center. A partition that
    /// leaves one side empty (all centers coincident on the axis) falls back
    /// to an even split.
    fn split_leaf(&mut self, index: u32) {
        let bound = self.nodes[index as usize].aabb;
        let axis = bound.longest_axis();
        let split = bound.center()[axis];
        let items = std::mem::take(&mut self.nodes[index as usize].items);

        let mut left_items = Vec::new();
        let mut right_items = Vec::new();
        for id in items {
            let center = self.proxies.get(id).expect("live proxy").aabb.center();
            if center[axis] <= split {
                left_items.push(id);
            } else {
                right_items.push(id);
            }
        }

        if left_items.is_empty() || right_items.is_empty() {
            let mut all = if left_items.is_empty() {
                right_items
            } else {
                left_items
            };
            all.sort_by(|&a, &b| {
                let ca = self.proxies.get(a).expect("live proxy").aabb.center()[axis];
                let cb = self.proxies.get(b).expect("live proxy").aabb.center()[axis];
                ca.partial_cmp(&cb).expect("finite box centers")
            });
            right_items = all.split_off(all.len() / 2);
            left_items = all;
        }

        debug!(
            "bvh: splitting leaf {index} into {} + {} items on axis {axis}",
            left_items.len(),
            right_items.len()
        );

        let left_aabb = self.bounds_of(&left_items);
        let right_aabb = self.bounds_of(&right_items);
        let left = self.alloc_node(Node::leaf(index, left_aabb, left_items));
        let right = self.alloc_node(Node::leaf(index, right_aabb, right_items));

        for child in [left, right] {
            let ids = self.nodes[child as usize].items.clone();
            for id in ids {
                self.leaf_of.insert(id, child);
            }
        }

        self.nodes[index as usize].left = left;
        self.nodes[index as usize].right = right;
    }

    /// Unlinks a proxy from its leaf. An emptied non-root leaf dissolves:
    /// the sibling takes the parent's place under the grandparent so every
    /// internal node keeps exactly two children. The root is never removed.
    fn detach(&mut self, id: ProxyId) {
        let index = self
            .leaf_of
            .remove(&id)
            .expect("proxy not present in broad phase");
        let items = &mut self.nodes[index as usize].items;
        let position = items
            .iter()
            .position(|&item| item == id)
            .expect("leaf_of points at the containing leaf");
        items.swap_remove(position);

        if self.nodes[index as usize].items.is_empty() && Some(index) != self.root {
            self.dissolve_leaf(index);
        } else {
            self.refit_from(index);
        }
    }

    fn dissolve_leaf(&mut self, index: u32) {
        let parent = self.nodes[index as usize].parent;
        let parent_node = &self.nodes[parent as usize];
        let sibling = if parent_node.left == index {
            parent_node.right
        } else {
            parent_node.left
        };
        let grandparent = parent_node.parent;

        if grandparent == NULL_NODE {
            self.root = Some(sibling);
            self.nodes[sibling as usize].parent = NULL_NODE;
        } else {
            let grandparent_node = &mut self.nodes[grandparent as usize];
            if grandparent_node.left == parent {
                grandparent_node.left = sibling;
            } else {
                grandparent_node.right = sibling;
            }
            self.nodes[sibling as usize].parent = grandparent;
            self.refit_from(grandparent);
        }

        self.free_node(index);
        self.free_node(parent);
    }

    fn node_pairs(&self, index: u32, out: &mut Vec<CandidatePair>) {
        let node = &self.nodes[index as usize];
        if node.is_leaf() {
            for i in 0..node.items.len() {
                for j in (i + 1)..node.items.len() {
                    let a = self.proxies.get(node.items[i]).expect("live proxy");
                    let b = self.proxies.get(node.items[j]).expect("live proxy");
                    if a.aabb.overlaps(&b.aabb) {
                        out.push(CandidatePair::new(node.items[i], node.items[j]));
                    }
                }
            }
        } else {
            self.node_pairs(node.left, out);
            self.node_pairs(node.right, out);
            self.cross_pairs(node.left, node.right, out);
        }
    }

    /// Tests every proxy in the subtree under `a` against every proxy under
    /// `b`, pruning subtree combinations whose merged bounds are disjoint.
    fn cross_pairs(&self, a: u32, b: u32, out: &mut Vec<CandidatePair>) {
        let node_a = &self.nodes[a as usize];
        let node_b = &self.nodes[b as usize];
        if !node_a.aabb.overlaps(&node_b.aabb) {
            return;
        }

        match (node_a.is_leaf(), node_b.is_leaf()) {
            (true, true) => {
                for &ia in &node_a.items {
                    for &ib in &node_b.items {
                        let pa = self.proxies.get(ia).expect("live proxy");
                        let pb = self.proxies.get(ib).expect("live proxy");
                        if pa.aabb.overlaps(&pb.aabb) {
                            out.push(CandidatePair::new(ia, ib));
                        }
                    }
                }
            }
            (true, false) => {
                self.cross_pairs(a, node_b.left, out);
                self.cross_pairs(a, node_b.right, out);
            }
            _ => {
                self.cross_pairs(node_a.left, b, out);
                self.cross_pairs(node_a.right, b, out);
            }
        }
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let Some(root) = self.root else { return };
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.is_leaf() {
                assert!(node.items.len() <= MAX_LEAF_OBJECTS);
                for &id in &node.items {
                    assert_eq!(self.leaf_of.get(&id), Some(&index));
                }
            } else {
                assert!(node.items.is_empty());
                let left = &self.nodes[node.left as usize];
                let right = &self.nodes[node.right as usize];
                assert_eq!(left.parent, index);
                assert_eq!(right.parent, index);
                assert_eq!(node.aabb, left.aabb.union(&right.aabb));
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }
}

impl BroadPhase for Bvh {
    fn insert(&mut self, shape: ShapeId, aabb: Aabb) -> ProxyId {
        let id = self.proxies.insert(Proxy { shape, aabb });
        self.insert_into_tree(id);
        id
    }

    fn remove(&mut self, proxy: ProxyId) -> ShapeId {
        let shape = self
            .proxies
            .get(proxy)
            .expect("proxy not present in broad phase")
            .shape;
        self.detach(proxy);
        self.proxies.remove(proxy);
        shape
    }

    fn update(&mut self, proxy: ProxyId, aabb: Aabb) {
        match self.proxies.get_mut(proxy) {
            Some(data) => data.aabb = aabb,
            None => panic!("proxy not present in broad phase"),
        }
        self.detach(proxy);
        self.insert_into_tree(proxy);
    }

    fn query_pairs(&self) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();
        if let Some(root) = self.root {
            self.node_pairs(root, &mut pairs);
        }
        pairs
    }

    fn query_aabb(&self, aabb: &Aabb) -> Vec<ProxyId> {
        let mut results = Vec::new();
        let Some(root) = self.root else {
            return results;
        };

        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            if node.is_leaf() {
                for &id in &node.items {
                    let proxy = self.proxies.get(id).expect("live proxy");
                    if proxy.aabb.overlaps(aabb) {
                        results.push(id);
                    }
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        results
    }

    fn query_ray(&self, ray: &Ray) -> Vec<ProxyId> {
        let mut results = Vec::new();
        let Some(root) = self.root else {
            return results;
        };

        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.aabb.ray_intersection(ray).is_none() {
                continue;
            }
            if node.is_leaf() {
                for &id in &node.items {
                    let proxy = self.proxies.get(id).expect("live proxy");
                    if proxy.aabb.ray_intersection(ray).is_some() {
                        results.push(id);
                    }
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
        results
    }

    fn clear(&mut self) {
        *self = Bvh::new();
    }

    fn len(&self) -> usize {
        self.proxies.len()
    }

    fn proxy(&self, proxy: ProxyId) -> Option<&Proxy> {
        self.proxies.get(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::SlotId;
    use glam::Vec3;

    fn unit_box(x: f32) -> Aabb {
        Aabb::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
    }

    fn shape(index: u32) -> ShapeId {
        SlotId::new(index, 0)
    }

    #[test]
    fn overflowing_leaf_splits_into_two_children() {
        let mut bvh = Bvh::new();
        for i in 0..=MAX_LEAF_OBJECTS {
            bvh.insert(shape(i as u32), unit_box(i as f32 * 3.0));
        }

        let root = bvh.root.expect("root exists");
        let root_node = &bvh.nodes[root as usize];
        assert!(!root_node.is_leaf(), "root must become internal");

        let left = &bvh.nodes[root_node.left as usize];
        let right = &bvh.nodes[root_node.right as usize];
        assert!(left.is_leaf() && right.is_leaf());
        assert_eq!(
            left.items.len() + right.items.len(),
            MAX_LEAF_OBJECTS + 1,
            "split must preserve every proxy"
        );
        assert_eq!(root_node.aabb, left.aabb.union(&right.aabb));
        bvh.assert_invariants();
    }

    #[test]
    fn leaf_reports_all_pairwise_combinations() {
        // Three boxes share one leaf and mutually overlap; an adjacent-only
        // scan would report two pairs instead of three.
        let mut bvh = Bvh::new();
        bvh.insert(shape(0), Aabb::new(Vec3::ZERO, Vec3::splat(3.0)));
        bvh.insert(shape(1), Aabb::new(Vec3::splat(0.5), Vec3::splat(3.5)));
        bvh.insert(shape(2), Aabb::new(Vec3::splat(1.0), Vec3::splat(4.0)));

        assert_eq!(bvh.query_pairs().len(), 3);
    }

    #[test]
    fn removal_dissolves_emptied_leaves() {
        let mut bvh = Bvh::new();
        let mut proxies = Vec::new();
        for i in 0..=MAX_LEAF_OBJECTS {
            proxies.push(bvh.insert(shape(i as u32), unit_box(i as f32 * 3.0)));
        }
        bvh.assert_invariants();

        for proxy in proxies {
            bvh.remove(proxy);
            bvh.assert_invariants();
        }
        assert_eq!(bvh.len(), 0);
        assert!(bvh.query_pairs().is_empty());
        // The root survives emptying.
        assert!(bvh.root.is_some());
    }

    #[test]
    #[should_panic(expected = "proxy not present")]
    fn removing_unknown_proxy_panics() {
        let mut bvh = Bvh::new();
        let proxy = bvh.insert(shape(0), unit_box(0.0));
        bvh.remove(proxy);
        bvh.remove(proxy);
    }

    #[test]
    fn update_reindexes_the_moved_proxy() {
        let mut bvh = Bvh::new();
        let a = bvh.insert(shape(0), unit_box(0.0));
        let _b = bvh.insert(shape(1), unit_box(10.0));
        assert!(bvh.query_pairs().is_empty());

        bvh.update(a, unit_box(10.2));
        let pairs = bvh.query_pairs();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].contains(a));
    }

    #[test]
    fn aabb_and_ray_queries_prune_by_bounds() {
        let mut bvh = Bvh::new();
        let near = bvh.insert(shape(0), unit_box(0.0));
        let far = bvh.insert(shape(1), unit_box(20.0));

        let hits = bvh.query_aabb(&Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)));
        assert_eq!(hits, vec![near]);

        let ray = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::X, 100.0);
        let hits = bvh.query_ray(&ray);
        assert!(hits.contains(&near) && hits.contains(&far));

        let short = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::X, 5.0);
        assert_eq!(bvh.query_ray(&short), vec![near]);
    }

    #[test]
    fn empty_index_queries_return_empty() {
        let bvh = Bvh::new();
        assert!(bvh.query_pairs().is_empty());
        assert!(bvh
            .query_aabb(&Aabb::new(Vec3::ZERO, Vec3::ONE))
            .is_empty());
        assert!(bvh
            .query_ray(&Ray::new(Vec3::ZERO, Vec3::X, 10.0))
            .is_empty());
    }
}
