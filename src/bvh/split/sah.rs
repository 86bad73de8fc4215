use nalgebra::Point3;
use tracing::trace;

use super::super::aabb::Aabb;
use super::{BuildPrimitive, SplitInfo, equal_subset, midpoint};

const BIN_COUNT: usize = 16;
// below this the binned estimate is noise
const MIN_PRIMITIVES_FOR_SAH: usize = 4;
// a node this small may stay a leaf when no split beats scanning it
const MAX_PRIMITIVES_PER_LEAF: usize = 8;
const TRAVERSAL_COST: f32 = 0.25;

#[derive(Clone, Copy, Debug, Default)]
struct Bin {
    bounds: Aabb,
    count: usize,
}

fn bin_index(axis: usize, centroid_bounds: &Aabb, centroid: &Point3<f32>) -> usize {
    let offset = centroid_bounds.normalized_offset(centroid)[axis];
    // float to int casts saturate, so a tiny negative offset lands in bin 0
    let bin = (BIN_COUNT as f32 * offset) as usize;
    usize::min(bin, BIN_COUNT - 1)
}

fn cost_function(
    parent_area: f32,
    left_count: usize,
    left: &Aabb,
    right_count: usize,
    right: &Aabb,
) -> f32 {
    let left_cost = left_count as f32 * (left.surface_area() / parent_area);
    let right_cost = right_count as f32 * (right.surface_area() / parent_area);
    TRAVERSAL_COST + left_cost + right_cost
}

// everything goes left when a small node is cheaper to scan than to split
pub(super) fn partition<'a>(
    info: &SplitInfo,
    prims: &'a mut [BuildPrimitive],
) -> (&'a mut [BuildPrimitive], &'a mut [BuildPrimitive]) {
    if prims.len() < MIN_PRIMITIVES_FOR_SAH {
        return equal_subset::partition(info, prims);
    }

    let parent_area = info.bounding_box.surface_area();
    if !parent_area.is_normal() {
        trace!(count = prims.len(), "flat bounds, falling back to midpoint split");
        return midpoint::partition(info, prims);
    }

    let axis = info.axis.index();
    let centroid_bounds = info.centroid_bounding_box;

    // assign each primitive to a bin
    let mut bins = [Bin::default(); BIN_COUNT];
    for prim in prims.iter() {
        let bin = &mut bins[bin_index(axis, &centroid_bounds, &prim.centroid)];
        bin.count += 1;
        bin.bounds = Aabb::union(&bin.bounds, &prim.aabb);
    }

    // split point i puts bins [0, i) on the left and [i, BIN_COUNT) on the right
    let mut plane_aabb_to_left = [Aabb::Empty; BIN_COUNT];
    let mut plane_primcount_to_left = [0; BIN_COUNT];
    let mut plane_aabb_to_right = [Aabb::Empty; BIN_COUNT];
    let mut plane_primcount_to_right = [0; BIN_COUNT];

    let mut aabb_to_left = Aabb::Empty;
    let mut primcount_to_left = 0;
    let mut aabb_to_right = Aabb::Empty;
    let mut primcount_to_right = 0;

    for plane in 0..BIN_COUNT {
        plane_aabb_to_left[plane] = aabb_to_left;
        plane_primcount_to_left[plane] = primcount_to_left;
        aabb_to_left = Aabb::union(&aabb_to_left, &bins[plane].bounds);
        primcount_to_left += bins[plane].count;

        let back = BIN_COUNT - 1 - plane;
        aabb_to_right = Aabb::union(&aabb_to_right, &bins[back].bounds);
        primcount_to_right += bins[back].count;
        plane_aabb_to_right[back] = aabb_to_right;
        plane_primcount_to_right[back] = primcount_to_right;
    }

    let mut best_cost = f32::INFINITY;
    let mut best_plane = 0;
    for plane in 0..BIN_COUNT {
        let cost = cost_function(
            parent_area,
            plane_primcount_to_left[plane],
            &plane_aabb_to_left[plane],
            plane_primcount_to_right[plane],
            &plane_aabb_to_right[plane],
        );
        if cost < best_cost {
            best_cost = cost;
            best_plane = plane;
        }
    }

    let linear_traversal_cost = prims.len() as f32;
    if prims.len() <= MAX_PRIMITIVES_PER_LEAF && best_cost >= linear_traversal_cost {
        trace!(count = prims.len(), best_cost, "splitting costs more than a scan, keeping leaf");
        let len = prims.len();
        return prims.split_at_mut(len);
    }

    let mid = ::partition::partition(&mut *prims, |prim| {
        bin_index(axis, &centroid_bounds, &prim.centroid) < best_plane
    })
    .0
    .len();

    if mid == 0 || mid == prims.len() {
        trace!(count = prims.len(), best_plane, "sah split degenerate, falling back to midpoint split");
        return midpoint::partition(info, prims);
    }

    prims.split_at_mut(mid)
}
