use crate::bvh::{
    Axis, LinearNode, PrimitiveRange,
    build::{BuildBvhNodeKind, BuildTree},
};

// depth-first, left child first: the left child of node i is always at i + 1
pub fn linearize(tree: &BuildTree) -> Vec<LinearNode> {
    let mut linear = Vec::with_capacity(tree.node_count());
    flatten(tree, tree.root_idx, &mut linear);
    linear
}

fn flatten(tree: &BuildTree, node_idx: usize, linear: &mut Vec<LinearNode>) -> usize {
    let node = &tree.nodes[node_idx];
    let offset = linear.len();

    match node.kind {
        BuildBvhNodeKind::Leaf(ref leaf) => {
            // leaves already index a contiguous run of the permuted primitives
            linear.push(LinearNode {
                aabb: node.aabb,
                primitives: Some(PrimitiveRange {
                    first: leaf.first_prim_idx_idx as u32,
                    count: leaf.prim_count as u32,
                }),
                right_index: -1,
                split_axis: Axis::default(),
            });
        }
        BuildBvhNodeKind::InternalNode(ref internal_node) => {
            // reserve the slot, the right index is known once the left subtree is laid out
            linear.push(LinearNode {
                aabb: node.aabb,
                primitives: None,
                right_index: -1,
                split_axis: internal_node.split_axis,
            });
            flatten(tree, internal_node.left_child_idx, linear);
            let right_index = flatten(tree, internal_node.right_child_idx, linear);
            linear[offset].right_index = right_index as i32;
        }
    }

    offset
}
