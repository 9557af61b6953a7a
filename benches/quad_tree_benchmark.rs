use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use geo_quadtree::QuadTree;
use rand::{rngs::StdRng, Rng, SeedableRng};
use uom::si::{f64::*, length::kilometer};

const NUM_POINTS: usize = 100_000;
const NUM_QUERIES: usize = 1_000;

fn random_points(seed: u64, n: usize) -> Vec<(f64, f64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (rng.gen_range(-90.0..90.0), rng.gen_range(-180.0..180.0)))
        .collect()
}

fn build_tree(points: &[(f64, f64)]) -> QuadTree<usize> {
    let mut tree = QuadTree::default();
    tree.extend(points.iter().enumerate().map(|(id, (lat, lon))| (*lat, *lon, id)));
    tree
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let points = random_points(1, NUM_POINTS);
    let queries = random_points(2, NUM_QUERIES);
    let tree = build_tree(&points);
    println!("Benchmark tree: {:?}", tree.stats());

    insert_benchmark(c, &points);
    nearest_benchmark(c, &tree, &queries);
    range_benchmark(c, &tree);
    radius_benchmark(c, &tree);
}

fn insert_benchmark(c: &mut Criterion, points: &[(f64, f64)]) {
    let mut group = c.benchmark_group("Insert");
    group.throughput(Throughput::Elements(points.len() as u64));
    group.sample_size(10);
    group.bench_function("default tree", |b| {
        b.iter_with_large_drop(|| build_tree(black_box(points)))
    });
    group.bench_function("remove all", |b| {
        b.iter_batched(
            || build_tree(points),
            |mut tree| {
                for (id, (lat, lon)) in points.iter().enumerate() {
                    tree.remove(*lat, *lon, &id);
                }
                tree
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn nearest_benchmark(c: &mut Criterion, tree: &QuadTree<usize>, queries: &[(f64, f64)]) {
    let mut group = c.benchmark_group("Nearest");
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("unbounded", |b| {
        b.iter(|| {
            queries
                .iter()
                .filter_map(|(lat, lon)| tree.nearest(*lat, *lon))
                .count()
        })
    });
    group.bench_function("within 1º", |b| {
        b.iter(|| {
            queries
                .iter()
                .filter_map(|(lat, lon)| tree.nearest_within(*lat, *lon, 1.0))
                .count()
        })
    });
    group.finish();
}

fn range_benchmark(c: &mut Criterion, tree: &QuadTree<usize>) {
    let mut group = c.benchmark_group("Range");
    group.bench_function("europe", |b| {
        b.iter_with_large_drop(|| tree.range(black_box(60.0), -10.0, 35.0, 30.0))
    });
    group.bench_function("across dateline", |b| {
        b.iter_with_large_drop(|| tree.range(black_box(10.0), 170.0, -10.0, -170.0))
    });
    group.finish();
}

fn radius_benchmark(c: &mut Criterion, tree: &QuadTree<usize>) {
    let mut group = c.benchmark_group("Radius");
    let dist = Length::new::<kilometer>(100.0);
    group.bench_function("100km", |b| {
        b.iter_with_large_drop(|| tree.within_radius(black_box(54.5), -8.3, dist))
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
