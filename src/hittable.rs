use nalgebra::{Point3, Vector3};

use crate::bvh::aabb::Aabb;
use crate::ray::Ray;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitRecord {
    pub point: Point3<f32>,
    // always faces against the incoming ray
    pub normal: Vector3<f32>,
    pub t: f32,
    pub front_face: bool,
    pub material: MaterialId,
}

impl HitRecord {
    pub fn new(
        ray: &Ray,
        t: f32,
        outward_normal: Vector3<f32>,
        material: MaterialId,
    ) -> HitRecord {
        let front_face = ray.direction.dot(&outward_normal) < 0.0;
        HitRecord {
            point: ray.at(t),
            normal: if front_face {
                outward_normal
            } else {
                -outward_normal
            },
            t,
            front_face,
            material,
        }
    }
}

pub trait Hittable {
    fn bounding_box(&self) -> Aabb;
    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord>;
}

impl<H: Hittable + ?Sized> Hittable for Box<H> {
    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }

    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        (**self).hit(ray, t_min, t_max)
    }
}

impl<H: Hittable + ?Sized> Hittable for &H {
    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }

    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        (**self).hit(ray, t_min, t_max)
    }
}

// linear scan, the reference the hierarchy has to agree with
#[derive(Clone, Debug)]
pub struct HittableList<P> {
    objects: Vec<P>,
    bounding_box: Aabb,
}

impl<P: Hittable> HittableList<P> {
    pub fn new(objects: Vec<P>) -> HittableList<P> {
        let bounding_box = objects
            .iter()
            .fold(Aabb::Empty, |bound, object| {
                Aabb::union(&bound, &object.bounding_box())
            });
        HittableList {
            objects,
            bounding_box,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn hit_index(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<(usize, HitRecord)> {
        let mut closest = None;
        let mut closest_so_far = t_max;
        for (i, object) in self.objects.iter().enumerate() {
            if let Some(rec) = object.hit(ray, t_min, closest_so_far) {
                closest_so_far = rec.t;
                closest = Some((i, rec));
            }
        }
        closest
    }
}

impl<P: Hittable> Hittable for HittableList<P> {
    fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        self.hit_index(ray, t_min, t_max).map(|(_, rec)| rec)
    }
}
