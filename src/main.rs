use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, ensure};
use bvh_tracer::config::TraceConfig;
use bvh_tracer::scene::Scene;
use bvh_tracer::{Bvh, HittableList, Ray, Sphere, SplitStrategy};
use rand::{SeedableRng, rngs::StdRng};
use threadpool::ThreadPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// rays handed to a worker at a time
const CHUNK_SIZE: usize = 4096;
// rays re-traced against the flat list per strategy
const VERIFY_SAMPLE: usize = 2000;

// index and distance of the nearest hit
type TraceResult = Option<(usize, f32)>;

fn trace_all(
    pool: &ThreadPool,
    bvh: &Arc<Bvh<Sphere>>,
    rays: &Arc<Vec<Ray>>,
    t_min: f32,
) -> anyhow::Result<Vec<TraceResult>> {
    let (result_sender, result_receiver) = mpsc::channel();
    let n_chunks = rays.len().div_ceil(CHUNK_SIZE);

    for chunk_idx in 0..n_chunks {
        let bvh = bvh.clone();
        let rays = rays.clone();
        let result_sender = result_sender.clone();
        pool.execute(move || {
            let start = chunk_idx * CHUNK_SIZE;
            let end = usize::min(start + CHUNK_SIZE, rays.len());
            let hits = rays[start..end]
                .iter()
                .map(|ray| {
                    bvh.hit_primitive(ray, t_min, f32::INFINITY)
                        .map(|(idx, rec)| (idx, rec.t))
                })
                .collect::<Vec<_>>();
            // a closed channel means the collector already bailed out
            result_sender.send((chunk_idx, hits)).ok();
        });
    }
    drop(result_sender);

    let mut chunks = vec![Vec::new(); n_chunks];
    for _ in 0..n_chunks {
        let (chunk_idx, hits) = result_receiver
            .recv()
            .context("trace worker exited without reporting")?;
        chunks[chunk_idx] = hits;
    }
    Ok(chunks.into_iter().flatten().collect())
}

// counts rays in the sample where the hierarchy and the flat list disagree
fn verify(list: &HittableList<Sphere>, rays: &[Ray], results: &[TraceResult], t_min: f32) -> usize {
    let step = usize::max(1, rays.len() / VERIFY_SAMPLE);
    rays.iter()
        .zip(results)
        .step_by(step)
        .filter(|(ray, result)| {
            let expected = list.hit_index(ray, t_min, f32::INFINITY);
            match (expected, result) {
                (None, None) => false,
                (Some((_, rec)), Some((_, t))) => (rec.t - t).abs() > 1e-4 * rec.t.max(1.0),
                _ => true,
            }
        })
        .count()
}

fn run(
    strategy: SplitStrategy,
    config: &TraceConfig,
    scene: &Scene,
    pool: &ThreadPool,
    rays: &Arc<Vec<Ray>>,
) -> anyhow::Result<()> {
    let build_start = Instant::now();
    let bvh = Arc::new(
        Bvh::new(scene.spheres.clone(), strategy)
            .with_context(|| format!("building {strategy} hierarchy"))?,
    );
    let build_time = build_start.elapsed();

    let trace_start = Instant::now();
    let results = trace_all(pool, &bvh, rays, config.t_min)?;
    let trace_time = trace_start.elapsed();

    let hits = results.iter().filter(|r| r.is_some()).count();
    let stats = bvh.stats();
    info!(
        %strategy,
        build_ms = build_time.as_secs_f64() * 1000.0,
        trace_ms = trace_time.as_secs_f64() * 1000.0,
        mrays_per_sec = rays.len() as f64 / trace_time.as_secs_f64() / 1e6,
        hits,
        nodes = stats.nodes,
        leaves = stats.leaves,
        max_depth = stats.max_depth,
        max_leaf_size = stats.max_leaf_size,
        "traced"
    );

    let list = HittableList::new(scene.spheres.clone());
    let mismatches = verify(&list, rays, &results, config.t_min);
    if mismatches > 0 {
        warn!(%strategy, mismatches, "hierarchy disagrees with brute force");
    }
    ensure!(
        mismatches == 0,
        "{strategy} hierarchy disagreed with brute force on {mismatches} rays"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            TraceConfig::load(&path).with_context(|| format!("loading config from {path}"))?
        }
        None => TraceConfig::default(),
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let scene = Scene::generate(&config.scene, &mut rng);
    let rays = Arc::new(scene.random_rays(&mut rng, config.rays));
    let pool = ThreadPool::new(config.worker_count());

    info!(
        spheres = scene.spheres.len(),
        rays = rays.len(),
        workers = pool.max_count(),
        "scene ready"
    );

    for &strategy in &config.strategies {
        run(strategy, &config, &scene, &pool, &rays)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvh_tracer::scene::{random_rays, random_spheres};

    #[test]
    fn pooled_trace_matches_serial_trace_in_ray_order() {
        let mut rng = StdRng::seed_from_u64(21);
        let spheres = random_spheres(&mut rng, 300, 0.5, 15.0);
        // more than one chunk, last one partial
        let rays = Arc::new(random_rays(&mut rng, 2 * CHUNK_SIZE + 17, 15.0));
        let bvh = Arc::new(Bvh::new(spheres.clone(), SplitStrategy::Midpoint).unwrap());
        let pool = ThreadPool::new(3);

        let results = trace_all(&pool, &bvh, &rays, 0.001).unwrap();
        assert_eq!(results.len(), rays.len());
        for (ray, result) in rays.iter().zip(&results) {
            let serial = bvh
                .hit_primitive(ray, 0.001, f32::INFINITY)
                .map(|(idx, rec)| (idx, rec.t));
            assert_eq!(*result, serial);
        }

        let list = HittableList::new(spheres);
        assert_eq!(verify(&list, &rays, &results, 0.001), 0);
    }

    #[test]
    fn verify_counts_disagreements() {
        let mut rng = StdRng::seed_from_u64(22);
        let spheres = random_spheres(&mut rng, 50, 0.5, 5.0);
        let rays = random_rays(&mut rng, 100, 5.0);
        let list = HittableList::new(spheres);
        let wrong = vec![Some((0, -1.0)); rays.len()];
        assert_eq!(verify(&list, &rays, &wrong, 0.001), rays.len());
    }
}
