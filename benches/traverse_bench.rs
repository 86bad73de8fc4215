use bvh_tracer::scene::{random_rays, random_spheres};
use bvh_tracer::{Bvh, HittableList, SplitStrategy};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};

const SPHERES: usize = 2000;
const RAYS: usize = 1000;

fn bench_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let spheres = random_spheres(&mut rng, SPHERES, 0.5, 60.0);

    let mut group = c.benchmark_group("build");
    for strategy in SplitStrategy::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &strategy, |b, &strategy| {
            b.iter(|| Bvh::new(black_box(spheres.clone()), strategy))
        });
    }
    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let spheres = random_spheres(&mut rng, SPHERES, 0.5, 60.0);
    let rays = random_rays(&mut rng, RAYS, 60.0);

    let mut group = c.benchmark_group("traverse");
    for strategy in SplitStrategy::ALL {
        let Ok(bvh) = Bvh::new(spheres.clone(), strategy) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &bvh, |b, bvh| {
            b.iter(|| {
                rays.iter()
                    .filter(|ray| bvh.hit(black_box(ray), 0.001, f32::INFINITY).is_some())
                    .count()
            })
        });
    }

    // flat list as the baseline
    let list = HittableList::new(spheres);
    group.bench_function("linear_scan", |b| {
        b.iter(|| {
            rays.iter()
                .filter(|ray| list.hit_index(black_box(ray), 0.001, f32::INFINITY).is_some())
                .count()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_traverse);
criterion_main!(benches);
