use nalgebra::Vector3;
use tracing::debug;

use crate::error::BuildError;
use crate::hittable::{HitRecord, Hittable};
use crate::ray::Ray;

pub mod aabb;
pub mod build;
pub mod linearize;
pub mod split;
pub mod traverse;

use aabb::Aabb;
use split::SplitStrategy;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    // ties go to X, then Y
    pub fn of_max_extent(extent: &Vector3<f32>) -> Axis {
        if extent.x >= extent.y && extent.x >= extent.z {
            Axis::X
        } else if extent.y >= extent.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimitiveRange {
    pub first: u32,
    pub count: u32,
}

impl PrimitiveRange {
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.first as usize..(self.first + self.count) as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearNode {
    pub aabb: Aabb,
    // Some for leaves, None for internal nodes
    pub primitives: Option<PrimitiveRange>,
    // index of the right child; the left child always follows its parent.
    // -1 for leaves
    pub right_index: i32,
    // meaningless for leaves
    pub split_axis: Axis,
}

impl LinearNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.primitives.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    // the root has depth 0
    pub max_depth: usize,
    pub max_leaf_size: usize,
    // splits that were forced to equal subsets to bound the depth
    pub forced_splits: usize,
}

#[derive(Clone, Debug)]
pub struct Bvh<P> {
    nodes: Vec<LinearNode>,
    // primitives in leaf order
    primitives: Vec<P>,
    // caller's index of each primitive slot
    prim_indices: Vec<u32>,
    strategy: SplitStrategy,
    stats: BvhStats,
}

impl<P: Hittable> Bvh<P> {
    pub fn new(primitives: Vec<P>, strategy: SplitStrategy) -> Result<Bvh<P>, BuildError> {
        let prim_aabbs = primitives
            .iter()
            .map(|prim| prim.bounding_box())
            .collect::<Vec<_>>();

        let tree = build::build_tree(&prim_aabbs, strategy)?;
        let nodes = linearize::linearize(&tree);
        let prim_order = tree.prim_order();
        let stats = tree.stats();

        // move the primitives into leaf order
        let mut slots = primitives.into_iter().map(Some).collect::<Vec<_>>();
        let primitives = prim_order
            .iter()
            .filter_map(|&prim_idx| slots[prim_idx].take())
            .collect::<Vec<_>>();
        debug_assert_eq!(primitives.len(), prim_order.len());

        let prim_indices = prim_order.iter().map(|&i| i as u32).collect();

        debug!(
            %strategy,
            primitives = primitives.len(),
            nodes = stats.nodes,
            leaves = stats.leaves,
            max_depth = stats.max_depth,
            max_leaf_size = stats.max_leaf_size,
            "built bvh"
        );

        Ok(Bvh {
            nodes,
            primitives,
            prim_indices,
            strategy,
            stats,
        })
    }

    #[inline]
    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        self.hit_primitive(ray, t_min, t_max).map(|(_, rec)| rec)
    }
}

impl<P> Bvh<P> {
    pub fn nodes(&self) -> &[LinearNode] {
        &self.nodes
    }

    // leaf order, as addressed by PrimitiveRange
    pub fn primitives(&self) -> &[P] {
        &self.primitives
    }

    // index the primitive in slot had in the list given to Bvh::new
    pub fn primitive_index(&self, slot: usize) -> usize {
        self.prim_indices[slot] as usize
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn strategy(&self) -> SplitStrategy {
        self.strategy
    }

    pub fn stats(&self) -> BvhStats {
        self.stats
    }

    pub fn root_bounding_box(&self) -> Aabb {
        self.nodes[0].aabb
    }
}

impl<P: Hittable> Hittable for Bvh<P> {
    // the root wrapper is never culled by its own box
    fn bounding_box(&self) -> Aabb {
        Aabb::infinite()
    }

    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        Bvh::hit(self, ray, t_min, t_max)
    }
}
