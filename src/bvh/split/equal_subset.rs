use super::{BuildPrimitive, SplitInfo};

// both halves are non-empty for two or more primitives
pub(super) fn partition<'a>(
    info: &SplitInfo,
    prims: &'a mut [BuildPrimitive],
) -> (&'a mut [BuildPrimitive], &'a mut [BuildPrimitive]) {
    let axis = info.axis.index();
    let mid = prims.len() / 2;

    // nth element only, the halves stay unordered
    if mid < prims.len() {
        prims.select_nth_unstable_by(mid, |a, b| a.aabb.min()[axis].total_cmp(&b.aabb.min()[axis]));
    }

    prims.split_at_mut(mid)
}
