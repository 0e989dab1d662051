use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use pima_explorer::clustering::{FuzzyCMeans, KMeans};
use pima_explorer::visualization::Pca;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_data(n_rows: usize, n_features: usize) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    Array2::from_shape_fn((n_rows, n_features), |(i, _)| {
        let offset = if i % 2 == 0 { 0.0 } else { 50.0 };
        offset + rng.gen::<f64>() * 10.0
    })
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    group.sample_size(20);

    for n_rows in [200, 1000, 5000].iter() {
        let x = create_data(*n_rows, 7);
        group.bench_with_input(BenchmarkId::new("fit", n_rows), &x, |b, x| {
            b.iter(|| {
                let mut model = KMeans::new(3);
                model.fit(black_box(x)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_fuzzy(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy_cmeans");
    group.sample_size(20);

    for m in [2.0, 3.0, 4.0] {
        let x = create_data(1000, 7);
        group.bench_with_input(BenchmarkId::new("fit_m", m), &x, |b, x| {
            b.iter(|| {
                let mut model = FuzzyCMeans::new(3, m);
                model.fit(black_box(x)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_pca(c: &mut Criterion) {
    let x = create_data(5000, 7);
    c.bench_function("pca_fit_transform", |b| {
        b.iter(|| Pca::default().fit_transform(black_box(&x)).unwrap())
    });
}

criterion_group!(benches, bench_kmeans, bench_fuzzy, bench_pca);
criterion_main!(benches);
