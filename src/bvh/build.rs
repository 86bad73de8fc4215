use tracing::warn;

use crate::bvh::{
    Axis, BvhStats,
    aabb::Aabb,
    split::{BuildPrimitive, SplitInfo, SplitStrategy},
};
use crate::error::BuildError;

// past this depth every split is an equal split, which keeps the tree shallower
// than the traversal stack for any primitive count that fits in the node indices
pub(crate) const FORCE_EQUAL_SPLIT_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug)]
pub(crate) struct BuildBvhLeaf {
    pub first_prim_idx_idx: usize,
    pub prim_count: usize,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BuildBvhInternalNode {
    pub split_axis: Axis,
    pub left_child_idx: usize,
    pub right_child_idx: usize,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum BuildBvhNodeKind {
    Leaf(BuildBvhLeaf),
    InternalNode(BuildBvhInternalNode),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BuildBvhNode {
    pub aabb: Aabb,
    pub kind: BuildBvhNodeKind,
}

#[derive(Clone, Debug)]
pub struct BuildTree {
    pub(crate) nodes: Vec<BuildBvhNode>,
    pub(crate) root_idx: usize,
    // permuted so that each leaf's primitives are contiguous
    pub(crate) prims: Vec<BuildPrimitive>,
    stats: BvhStats,
}

impl BuildTree {
    // caller's primitive index for each slot of prims
    pub fn prim_order(&self) -> Vec<usize> {
        self.prims.iter().map(|prim| prim.prim_idx).collect()
    }

    pub fn stats(&self) -> BvhStats {
        self.stats
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

struct Builder<'a> {
    strategy: SplitStrategy,
    nodes: Vec<BuildBvhNode>,
    prims: &'a mut [BuildPrimitive],
    stats: BvhStats,
}

impl Builder<'_> {
    fn leaf_bounds(&self, leaf: &BuildBvhLeaf) -> Aabb {
        self.prims[leaf.first_prim_idx_idx..(leaf.first_prim_idx_idx + leaf.prim_count)]
            .iter()
            .fold(Aabb::Empty, |bound, prim| Aabb::union(&bound, &prim.aabb))
    }

    fn insert_leaf_node(&mut self, leaf: BuildBvhLeaf) -> usize {
        let node_idx = self.nodes.len();
        let aabb = self.leaf_bounds(&leaf);
        self.nodes.push(BuildBvhNode {
            aabb,
            kind: BuildBvhNodeKind::Leaf(leaf),
        });
        node_idx
    }

    fn record_leaf(&mut self, depth: usize, prim_count: usize) {
        self.stats.leaves += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        self.stats.max_leaf_size = self.stats.max_leaf_size.max(prim_count);
    }

    // turns the leaf at node_idx into an internal node with two leaf children
    fn split_leaf(
        &mut self,
        node_idx: usize,
        split_axis: Axis,
        leaf: BuildBvhLeaf,
        left_count: usize,
        depth: usize,
    ) {
        let left_child_idx = self.insert_leaf_node(BuildBvhLeaf {
            first_prim_idx_idx: leaf.first_prim_idx_idx,
            prim_count: left_count,
        });
        let right_child_idx = self.insert_leaf_node(BuildBvhLeaf {
            first_prim_idx_idx: leaf.first_prim_idx_idx + left_count,
            prim_count: leaf.prim_count - left_count,
        });

        self.nodes[node_idx].kind = BuildBvhNodeKind::InternalNode(BuildBvhInternalNode {
            split_axis,
            left_child_idx,
            right_child_idx,
        });

        self.subdivide(left_child_idx, depth + 1);
        self.subdivide(right_child_idx, depth + 1);
    }

    fn subdivide(&mut self, node_idx: usize, depth: usize) {
        let BuildBvhNodeKind::Leaf(leaf) = self.nodes[node_idx].kind else {
            return;
        };

        match leaf.prim_count {
            0 | 1 => self.record_leaf(depth, leaf.prim_count),
            // the axis is arbitrary for a pair
            2 => self.split_leaf(node_idx, Axis::X, leaf, 1, depth),
            _ => {
                let range = leaf.first_prim_idx_idx..(leaf.first_prim_idx_idx + leaf.prim_count);
                let info = SplitInfo::for_primitives(&self.prims[range.clone()]);

                let strategy = if depth >= FORCE_EQUAL_SPLIT_DEPTH {
                    self.stats.forced_splits += 1;
                    SplitStrategy::EqualSubset
                } else {
                    self.strategy
                };

                let left_count = strategy.partition(&info, &mut self.prims[range]).0.len();

                // a one-sided split means the strategy wants a leaf here
                if left_count == 0 || left_count == leaf.prim_count {
                    self.record_leaf(depth, leaf.prim_count);
                } else {
                    self.split_leaf(node_idx, info.axis, leaf, left_count, depth);
                }
            }
        }
    }
}

// prim_aabbs[i] is the bounding box of primitive i
pub fn build_tree(prim_aabbs: &[Aabb], strategy: SplitStrategy) -> Result<BuildTree, BuildError> {
    let n_prims = prim_aabbs.len();
    if n_prims == 0 {
        return Err(BuildError::EmptyPrimitives);
    }
    // a binary tree over n leaves has 2n - 1 nodes, indexed with i32
    if n_prims > (i32::MAX as usize) / 2 {
        return Err(BuildError::TooManyPrimitives(n_prims));
    }

    let mut prims = prim_aabbs
        .iter()
        .enumerate()
        .map(|(prim_idx, aabb)| BuildPrimitive::new(prim_idx, *aabb))
        .collect::<Vec<_>>();

    let mut builder = Builder {
        strategy,
        nodes: Vec::with_capacity(2 * n_prims - 1),
        prims: &mut prims,
        stats: BvhStats::default(),
    };

    // create root node
    let root_idx = builder.insert_leaf_node(BuildBvhLeaf {
        first_prim_idx_idx: 0,
        prim_count: n_prims,
    });
    builder.subdivide(root_idx, 0);

    let mut stats = builder.stats;
    let nodes = builder.nodes;
    stats.nodes = nodes.len();

    if stats.forced_splits > 0 {
        warn!(
            %strategy,
            forced_splits = stats.forced_splits,
            "hierarchy reached depth {FORCE_EQUAL_SPLIT_DEPTH}, deeper levels were split into equal subsets"
        );
    }

    Ok(BuildTree {
        nodes,
        root_idx,
        prims,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn cube(x: f32, y: f32, z: f32, half: f32) -> Aabb {
        let c = Point3::new(x, y, z);
        Aabb::new(c - Vector3::repeat(half), c + Vector3::repeat(half))
    }

    // every primitive box must sit inside all of its ancestors
    fn check_containment(tree: &BuildTree, node_idx: usize, ancestors: &mut Vec<Aabb>) {
        let node = &tree.nodes[node_idx];
        for ancestor in ancestors.iter() {
            assert!(ancestor.contains(&node.aabb));
        }
        match node.kind {
            BuildBvhNodeKind::Leaf(leaf) => {
                let range = leaf.first_prim_idx_idx..leaf.first_prim_idx_idx + leaf.prim_count;
                for prim in &tree.prims[range] {
                    assert!(node.aabb.contains(&prim.aabb));
                    for ancestor in ancestors.iter() {
                        assert!(ancestor.contains(&prim.aabb));
                    }
                }
            }
            BuildBvhNodeKind::InternalNode(internal) => {
                let left = tree.nodes[internal.left_child_idx].aabb;
                let right = tree.nodes[internal.right_child_idx].aabb;
                assert_eq!(node.aabb, Aabb::union(&left, &right));
                ancestors.push(node.aabb);
                check_containment(tree, internal.left_child_idx, ancestors);
                check_containment(tree, internal.right_child_idx, ancestors);
                ancestors.pop();
            }
        }
    }

    fn leaf_sizes(tree: &BuildTree) -> Vec<usize> {
        tree.nodes
            .iter()
            .filter_map(|node| match node.kind {
                BuildBvhNodeKind::Leaf(leaf) => Some(leaf.prim_count),
                BuildBvhNodeKind::InternalNode(_) => None,
            })
            .collect()
    }

    #[test]
    fn empty_input_fails_fast() {
        let err = build_tree(&[], SplitStrategy::Midpoint).unwrap_err();
        assert_eq!(err, BuildError::EmptyPrimitives);
    }

    #[test]
    fn single_primitive_is_a_leaf_root() {
        let tree = build_tree(&[cube(0.0, 0.0, 0.0, 1.0)], SplitStrategy::SurfaceAreaHeuristic)
            .unwrap();
        assert_eq!(tree.node_count(), 1);
        assert!(matches!(
            tree.nodes[tree.root_idx].kind,
            BuildBvhNodeKind::Leaf(l) if l.prim_count == 1
        ));
        assert_eq!(tree.stats().max_depth, 0);
    }

    #[test]
    fn pair_becomes_internal_node_on_x() {
        let tree = build_tree(
            &[cube(0.0, 0.0, 0.0, 1.0), cube(0.0, 5.0, 0.0, 1.0)],
            SplitStrategy::EqualSubset,
        )
        .unwrap();
        assert_eq!(tree.node_count(), 3);
        match tree.nodes[tree.root_idx].kind {
            BuildBvhNodeKind::InternalNode(internal) => assert_eq!(internal.split_axis, Axis::X),
            BuildBvhNodeKind::Leaf(_) => panic!("root of a pair must be internal"),
        }
    }

    #[test]
    fn every_strategy_contains_primitives_in_ancestors() {
        let aabbs = (0..200)
            .map(|i| {
                let f = i as f32;
                let half = 0.3 + (i % 4) as f32 * 0.2;
                cube((f * 7.3) % 40.0, (f * 3.1) % 17.0, (f * 1.7) % 9.0, half)
            })
            .collect::<Vec<_>>();
        for strategy in SplitStrategy::ALL {
            let tree = build_tree(&aabbs, strategy).unwrap();
            check_containment(&tree, tree.root_idx, &mut vec![]);
            assert_eq!(leaf_sizes(&tree).iter().sum::<usize>(), aabbs.len());
            let mut order = tree.prim_order();
            order.sort_unstable();
            assert_eq!(order, (0..aabbs.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn equal_subsets_build_single_primitive_leaves() {
        let aabbs = (0..33).map(|i| cube(i as f32, 0.0, 0.0, 0.4)).collect::<Vec<_>>();
        let tree = build_tree(&aabbs, SplitStrategy::EqualSubset).unwrap();
        assert!(leaf_sizes(&tree).iter().all(|&n| n == 1));
        assert_eq!(tree.stats().nodes, 2 * 33 - 1);
        assert_eq!(tree.stats().leaves, 33);
        // ceil(log2(33))
        assert_eq!(tree.stats().max_depth, 6);
    }

    #[test]
    fn all_coincident_primitives_terminate() {
        let aabbs = vec![cube(2.0, 2.0, 2.0, 1.0); 500];
        for strategy in SplitStrategy::ALL {
            let tree = build_tree(&aabbs, strategy).unwrap();
            assert_eq!(leaf_sizes(&tree).iter().sum::<usize>(), 500);
            assert!(tree.stats().max_depth < 64);
        }
    }

    #[test]
    fn exponential_spacing_is_depth_limited() {
        // each midpoint split peels off a single primitive
        let aabbs = (0..120)
            .map(|i| {
                let scale = if i % 2 == 0 { 1.0 } else { 1.5 };
                cube(2f32.powi(i / 2) * scale, 0.0, 0.0, 0.0)
            })
            .collect::<Vec<_>>();
        let tree = build_tree(&aabbs, SplitStrategy::Midpoint).unwrap();
        let stats = tree.stats();
        assert!(stats.forced_splits > 0);
        assert!(stats.max_depth <= FORCE_EQUAL_SPLIT_DEPTH + 8, "depth {}", stats.max_depth);
    }
}
