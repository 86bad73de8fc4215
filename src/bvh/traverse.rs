use crate::bvh::Bvh;
use crate::hittable::{HitRecord, Hittable};
use crate::ray::Ray;

// the builder keeps trees shallower than this
pub const MAX_DEPTH: usize = 64;

impl<P: Hittable> Bvh<P> {
    // nearest hit in [t_min, t_max] and the caller's index of the primitive hit
    pub fn hit_primitive(
        &self,
        ray: &Ray,
        t_min: f32,
        mut t_max: f32,
    ) -> Option<(usize, HitRecord)> {
        let mut visit_stack = [0u32; MAX_DEPTH];
        let mut visit_head = 0;
        let mut node_idx = 0;
        let mut closest = None;

        loop {
            let node = &self.nodes[node_idx];

            if node.aabb.intersects(ray, t_min, t_max) {
                match node.primitives {
                    None => {
                        debug_assert!(visit_head < MAX_DEPTH, "bvh deeper than traversal stack");
                        let right_idx = node.right_index as usize;
                        if ray.direction[node.split_axis.index()] > 0.0 {
                            visit_stack[visit_head] = right_idx as u32;
                            node_idx += 1;
                        } else {
                            visit_stack[visit_head] = (node_idx + 1) as u32;
                            node_idx = right_idx;
                        }
                        visit_head += 1;
                        continue;
                    }
                    Some(range) => {
                        for slot in range.slots() {
                            if let Some(rec) = self.primitives[slot].hit(ray, t_min, t_max) {
                                t_max = rec.t;
                                closest = Some((self.prim_indices[slot] as usize, rec));
                            }
                        }
                    }
                }
            }

            if visit_head == 0 {
                return closest;
            }
            visit_head -= 1;
            node_idx = visit_stack[visit_head] as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bvh::Bvh;
    use crate::bvh::split::SplitStrategy;
    use crate::hittable::{Hittable, HittableList, MaterialId};
    use crate::ray::Ray;
    use crate::sphere::Sphere;
    use nalgebra::{Point3, Vector3};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn row_of_spheres(n: u32) -> Vec<Sphere> {
        (0..n)
            .map(|i| Sphere::new(Point3::new(i as f32 * 2.0, 0.0, 0.0), 0.5, MaterialId(i)))
            .collect()
    }

    #[test]
    fn ray_along_the_row_hits_the_first_sphere_in_either_direction() {
        for strategy in SplitStrategy::ALL {
            let bvh = Bvh::new(row_of_spheres(40), strategy).unwrap();

            let forward = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
            let (idx, rec) = bvh.hit_primitive(&forward, 0.001, f32::INFINITY).unwrap();
            assert_eq!(idx, 0);
            assert!((rec.t - 9.5).abs() < 1e-4);

            let backward = Ray::new(Point3::new(100.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
            let (idx, rec) = bvh.hit_primitive(&backward, 0.001, f32::INFINITY).unwrap();
            assert_eq!(idx, 39);
            assert!((rec.t - 21.5).abs() < 1e-4);
        }
    }

    #[test]
    fn interval_limits_are_respected() {
        let bvh = Bvh::new(row_of_spheres(10), SplitStrategy::SurfaceAreaHeuristic).unwrap();
        let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        // first sphere is entered at 9.5 and left at 10.5
        assert!(bvh.hit(&ray, 0.001, 9.0).is_none());
        let rec = bvh.hit(&ray, 10.6, f32::INFINITY).unwrap();
        assert_eq!(rec.material, MaterialId(1));
    }

    #[test]
    fn miss_returns_none() {
        let bvh = Bvh::new(row_of_spheres(10), SplitStrategy::Midpoint).unwrap();
        let ray = Ray::new(Point3::new(0.0, 5.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(bvh.hit(&ray, 0.001, f32::INFINITY).is_none());
    }

    #[test]
    fn axis_parallel_rays_agree_with_a_linear_scan() {
        let mut rng = StdRng::seed_from_u64(11);
        let spheres = (0..200)
            .map(|i| {
                let c = Point3::new(
                    rng.random_range(-20.0..20.0),
                    rng.random_range(-20.0..20.0),
                    rng.random_range(-20.0..20.0),
                );
                Sphere::new(c, rng.random_range(0.2..1.5), MaterialId(i))
            })
            .collect::<Vec<_>>();
        let list = HittableList::new(spheres.clone());

        for strategy in SplitStrategy::ALL {
            let bvh = Bvh::new(spheres.clone(), strategy).unwrap();
            for _ in 0..500 {
                // zero direction components exercise the infinite inverse directions
                let mut direction = Vector3::zeros();
                let axis = rng.random_range(0..3);
                direction[axis] = if rng.random::<bool>() { 1.0 } else { -1.0 };
                let origin = Point3::new(
                    rng.random_range(-25.0..25.0),
                    rng.random_range(-25.0..25.0),
                    rng.random_range(-25.0..25.0),
                );
                let ray = Ray::new(origin, direction);

                let expected = list.hit(&ray, 0.001, f32::INFINITY).map(|rec| rec.material);
                let actual = bvh.hit(&ray, 0.001, f32::INFINITY).map(|rec| rec.material);
                assert_eq!(actual, expected, "{strategy} disagrees on {ray:?}");
            }
        }
    }
}
