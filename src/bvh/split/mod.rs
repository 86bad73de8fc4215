use std::fmt;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::Axis;
use super::aabb::Aabb;

mod equal_subset;
mod midpoint;
mod sah;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildPrimitive {
    // index into the caller's primitive list
    pub prim_idx: usize,
    pub aabb: Aabb,
    pub centroid: Point3<f32>,
}

impl BuildPrimitive {
    pub fn new(prim_idx: usize, aabb: Aabb) -> BuildPrimitive {
        BuildPrimitive {
            prim_idx,
            aabb,
            centroid: aabb.centroid(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitInfo {
    pub axis: Axis,
    // union of the primitive boxes
    pub bounding_box: Aabb,
    // union of the primitive centroids
    pub centroid_bounding_box: Aabb,
}

impl SplitInfo {
    pub fn for_primitives(prims: &[BuildPrimitive]) -> SplitInfo {
        let mut bounding_box = Aabb::Empty;
        let mut centroid_bounding_box = Aabb::Empty;
        for prim in prims {
            bounding_box = Aabb::union(&bounding_box, &prim.aabb);
            centroid_bounding_box = centroid_bounding_box.union_point(&prim.centroid);
        }
        SplitInfo {
            axis: Axis::of_max_extent(&centroid_bounding_box.extent()),
            bounding_box,
            centroid_bounding_box,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    // median of the box minimum
    EqualSubset,
    // middle of the centroid bounds
    Midpoint,
    #[default]
    #[serde(rename = "sah", alias = "surface_area_heuristic")]
    SurfaceAreaHeuristic,
}

impl SplitStrategy {
    pub const ALL: [SplitStrategy; 3] = [
        SplitStrategy::EqualSubset,
        SplitStrategy::Midpoint,
        SplitStrategy::SurfaceAreaHeuristic,
    ];

    pub fn partition<'a>(
        &self,
        info: &SplitInfo,
        prims: &'a mut [BuildPrimitive],
    ) -> (&'a mut [BuildPrimitive], &'a mut [BuildPrimitive]) {
        match self {
            SplitStrategy::EqualSubset => equal_subset::partition(info, prims),
            SplitStrategy::Midpoint => midpoint::partition(info, prims),
            SplitStrategy::SurfaceAreaHeuristic => sah::partition(info, prims),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SplitStrategy::EqualSubset => "equal_subset",
            SplitStrategy::Midpoint => "midpoint",
            SplitStrategy::SurfaceAreaHeuristic => "sah",
        }
    }
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
