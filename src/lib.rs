pub mod bvh;
pub mod config;
pub mod error;
pub mod hittable;
pub mod ray;
pub mod scene;
pub mod sphere;

pub use bvh::aabb::Aabb;
pub use bvh::split::SplitStrategy;
pub use bvh::{Bvh, BvhStats, LinearNode};
pub use error::{BuildError, ConfigError};
pub use hittable::{HitRecord, Hittable, HittableList, MaterialId};
pub use ray::Ray;
pub use sphere::Sphere;
