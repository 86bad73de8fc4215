use nalgebra::{Point3, Vector3};
use rand::Rng;
use tracing::{debug, warn};

use crate::config::SceneConfig;
use crate::hittable::MaterialId;
use crate::ray::Ray;
use crate::sphere::Sphere;

pub const GROUND: MaterialId = MaterialId(0);
pub const DIFFUSE: MaterialId = MaterialId(1);
pub const METAL: MaterialId = MaterialId(2);
pub const GLASS: MaterialId = MaterialId(3);

// placement attempts per requested sphere before giving up on a crowded cube
const PLACEMENT_ATTEMPTS: usize = 64;

#[derive(Clone, Debug)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    // half-width of the cube ray origins are drawn from
    pub view_extent: f32,
}

impl Scene {
    pub fn generate<R: Rng>(config: &SceneConfig, rng: &mut R) -> Scene {
        match *config {
            SceneConfig::BookCover => Scene {
                spheres: book_cover(rng),
                view_extent: 13.0,
            },
            SceneConfig::RandomSpheres {
                count,
                radius,
                extent,
            } => Scene {
                spheres: random_spheres(rng, count, radius, extent),
                view_extent: extent,
            },
        }
    }

    pub fn random_rays<R: Rng>(&self, rng: &mut R, count: usize) -> Vec<Ray> {
        random_rays(rng, count, self.view_extent)
    }
}

// grid cells too close to the metal sphere stay empty
pub fn book_cover<R: Rng>(rng: &mut R) -> Vec<Sphere> {
    let mut world = vec![Sphere::new(Point3::new(0.0, -1000.0, 0.0), 1000.0, GROUND)];

    let keep_clear = Point3::new(4.0, 0.2, 0.0);
    for a in -11..11 {
        for b in -11..11 {
            let choose_mat: f32 = rng.random();
            let center = Point3::new(
                a as f32 + 0.9 * rng.random::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.random::<f32>(),
            );
            if (center - keep_clear).norm() <= 0.9 {
                continue;
            }
            let material = if choose_mat < 0.8 {
                DIFFUSE
            } else if choose_mat < 0.95 {
                METAL
            } else {
                GLASS
            };
            world.push(Sphere::new(center, 0.2, material));
        }
    }

    world.push(Sphere::new(Point3::new(0.0, 1.0, 0.0), 1.0, GLASS));
    world.push(Sphere::new(Point3::new(-4.0, 1.0, 0.0), 1.0, DIFFUSE));
    world.push(Sphere::new(Point3::new(4.0, 1.0, 0.0), 1.0, METAL));

    debug!(spheres = world.len(), "generated book cover scene");
    world
}

// rejection sampled, so a cube too small for count spheres yields fewer
pub fn random_spheres<R: Rng>(rng: &mut R, count: usize, radius: f32, extent: f32) -> Vec<Sphere> {
    let mut spheres: Vec<Sphere> = Vec::with_capacity(count);
    let limit = (extent - radius).max(0.0);
    let min_dist_sq = (2.0 * radius) * (2.0 * radius);

    let mut attempts = 0;
    while spheres.len() < count && attempts < count.saturating_mul(PLACEMENT_ATTEMPTS) {
        attempts += 1;
        let center = if limit > 0.0 {
            Point3::new(
                rng.random_range(-limit..=limit),
                rng.random_range(-limit..=limit),
                rng.random_range(-limit..=limit),
            )
        } else {
            Point3::origin()
        };
        let overlaps = spheres
            .iter()
            .any(|s| (s.center - center).norm_squared() < min_dist_sq);
        if !overlaps {
            let material = MaterialId(spheres.len() as u32);
            spheres.push(Sphere::new(center, radius, material));
        }
    }

    if spheres.len() < count {
        warn!(requested = count, placed = spheres.len(), "scene too crowded");
    }
    debug!(spheres = spheres.len(), attempts, "generated random sphere scene");
    spheres
}

pub fn random_rays<R: Rng>(rng: &mut R, count: usize, extent: f32) -> Vec<Ray> {
    (0..count)
        .map(|_| {
            let origin = Point3::new(
                rng.random_range(-extent..=extent),
                rng.random_range(-extent..=extent),
                rng.random_range(-extent..=extent),
            );
            Ray::new(origin, random_unit_vector(rng))
        })
        .collect()
}

fn random_unit_vector<R: Rng>(rng: &mut R) -> Vector3<f32> {
    loop {
        let v: Vector3<f32> = Vector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let len_sq = v.norm_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}
