use criterion::{Criterion, criterion_group, criterion_main};
use ephys_epochs::{Bandwidth, KernelDensity, Periodogram, step_window};
use ndarray::Array2;
use std::hint::black_box;

fn bench_step_window(c: &mut Criterion) {
    // one 10 s sweep at 10 kHz, 2 channels, 75% overlap
    let array = Array2::from_shape_fn((100_000, 2), |(i, j)| (i as f64 * 0.001).sin() + j as f64);

    c.bench_function("step_window 100k rows", |b| {
        b.iter(|| step_window(black_box(&array), 2000, 500).unwrap())
    });
}

fn bench_kernel_density(c: &mut Criterion) {
    let data: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.37).sin() * 10.0 - 50.0).collect();

    c.bench_function("kde 2000 samples x 256 grid", |b| {
        b.iter(|| {
            KernelDensity::estimate(black_box(&data), -65.0, -35.0, 256, Bandwidth::Silverman)
                .unwrap()
        })
    });
}

fn bench_periodogram(c: &mut Criterion) {
    let data: Vec<f64> = (0..4096)
        .map(|i| (2.0 * std::f64::consts::PI * 40.0 * i as f64 / 10_000.0).sin())
        .collect();

    c.bench_function("periodogram 4096 samples", |b| {
        b.iter(|| Periodogram::estimate(black_box(&data), 10_000.0).unwrap())
    });
}

criterion_group!(
    benches,
    bench_step_window,
    bench_kernel_density,
    bench_periodogram
);
criterion_main!(benches);
