use nalgebra::{Point3, Vector3};

use crate::ray::Ray;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Aabb {
    // identity element of `union`
    Empty,
    NonEmpty { min: Point3<f32>, max: Point3<f32> },
}

impl Default for Aabb {
    fn default() -> Aabb {
        Aabb::Empty
    }
}

impl Aabb {
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Aabb {
        Aabb::NonEmpty {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    // every ray with t_min < t_max hits it
    pub fn infinite() -> Aabb {
        Aabb::NonEmpty {
            min: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            max: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        }
    }

    pub fn from_point(point: Point3<f32>) -> Aabb {
        Aabb::NonEmpty {
            min: point,
            max: point,
        }
    }

    pub fn from_points(points: &[Point3<f32>]) -> Aabb {
        points
            .iter()
            .fold(Aabb::Empty, |bound, point| bound.union_point(point))
    }

    pub fn union(a: &Aabb, b: &Aabb) -> Aabb {
        match (a, b) {
            (Aabb::Empty, _) => *b,
            (_, Aabb::Empty) => *a,
            (
                Aabb::NonEmpty {
                    min: amin,
                    max: amax,
                },
                Aabb::NonEmpty {
                    min: bmin,
                    max: bmax,
                },
            ) => Aabb::NonEmpty {
                min: amin.inf(bmin),
                max: amax.sup(bmax),
            },
        }
    }

    pub fn union_point(&self, point: &Point3<f32>) -> Aabb {
        match self {
            Aabb::Empty => Aabb::from_point(*point),
            Aabb::NonEmpty { min, max } => Aabb::NonEmpty {
                min: min.inf(point),
                max: max.sup(point),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Aabb::Empty)
    }

    pub fn surface_area(&self) -> f32 {
        match self {
            Aabb::Empty => 0.0,
            Aabb::NonEmpty { min, max } => {
                let diff = max - min;
                2.0 * (diff.x * diff.y + diff.x * diff.z + diff.y * diff.z)
            }
        }
    }

    pub fn min(&self) -> Point3<f32> {
        match self {
            Aabb::Empty => Point3::origin(),
            Aabb::NonEmpty { min, .. } => *min,
        }
    }

    pub fn max(&self) -> Point3<f32> {
        match self {
            Aabb::Empty => Point3::origin(),
            Aabb::NonEmpty { max, .. } => *max,
        }
    }

    pub fn extent(&self) -> Vector3<f32> {
        match self {
            Aabb::Empty => Vector3::zeros(),
            Aabb::NonEmpty { min, max } => max - min,
        }
    }

    pub fn centroid(&self) -> Point3<f32> {
        match self {
            Aabb::Empty => Point3::origin(),
            Aabb::NonEmpty { min, max } => Point3::from((min.coords + max.coords) / 2.0),
        }
    }

    // per-axis fraction of the extent, a flat axis maps to 0
    pub fn normalized_offset(&self, point: &Point3<f32>) -> Vector3<f32> {
        match self {
            Aabb::Empty => Vector3::zeros(),
            Aabb::NonEmpty { min, max } => {
                let offset = point - min;
                let extent = max - min;
                offset.zip_map(&extent, |o, e| if e > 0.0 { o / e } else { 0.0 })
            }
        }
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        match (self, other) {
            (_, Aabb::Empty) => true,
            (Aabb::Empty, _) => false,
            (
                Aabb::NonEmpty { min, max },
                Aabb::NonEmpty {
                    min: omin,
                    max: omax,
                },
            ) => {
                min.x <= omin.x
                    && min.y <= omin.y
                    && min.z <= omin.z
                    && max.x >= omax.x
                    && max.y >= omax.y
                    && max.z >= omax.z
            }
        }
    }

    // slab test, returns the clipped (near, far) interval
    #[inline]
    fn slab(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<(f32, f32)> {
        let Aabb::NonEmpty { min, max } = self else {
            return None;
        };

        let t0 = (min - ray.origin).component_mul(&ray.inv_direction);
        let t1 = (max - ray.origin).component_mul(&ray.inv_direction);

        let mut near = t_min;
        let mut far = t_max;
        for axis in 0..3 {
            // 0 * inf: the ray runs inside a slab plane, so this axis does not clip
            if t0[axis].is_nan() || t1[axis].is_nan() {
                continue;
            }
            near = near.max(t0[axis].min(t1[axis]));
            far = far.min(t0[axis].max(t1[axis]));
        }

        if near < far { Some((near, far)) } else { None }
    }

    #[inline]
    pub fn intersects(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        self.slab(ray, t_min, t_max).is_some()
    }

    // clamped to t_min
    #[inline]
    pub fn entry_distance(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<f32> {
        self.slab(ray, t_min, t_max).map(|(near, _)| near)
    }
}
