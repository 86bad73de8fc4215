use tracing::trace;

use super::{BuildPrimitive, SplitInfo, equal_subset};

// centroids below the middle of the centroid bounds go left
pub(super) fn partition<'a>(
    info: &SplitInfo,
    prims: &'a mut [BuildPrimitive],
) -> (&'a mut [BuildPrimitive], &'a mut [BuildPrimitive]) {
    let axis = info.axis.index();
    let split_pos = info.centroid_bounding_box.centroid()[axis];

    let mid = ::partition::partition(&mut *prims, |prim| prim.centroid[axis] < split_pos)
        .0
        .len();

    if mid == 0 || mid == prims.len() {
        trace!(count = prims.len(), "midpoint split degenerate, falling back to equal subsets");
        return equal_subset::partition(info, prims);
    }

    prims.split_at_mut(mid)
}
