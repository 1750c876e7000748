//! Benchmarks for masked sparse multiplication
//!
//! Compares the parallel kernel against the sequential reference and the
//! sprs product on banded and random operands.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use semiring_saxpy::{
    min_plus, multiply_with_config, plus_times, reference_multiply, to_sprs, Mask, Matrix,
    MultiplyConfig,
};
use std::hint::black_box;
use std::time::Duration;

/// Banded matrix with `half_width` diagonals on each side of the main one
fn banded(n: usize, half_width: usize) -> Matrix<f64> {
    let mut triplets = Vec::new();
    for j in 0..n {
        let lo = j.saturating_sub(half_width);
        let hi = (j + half_width + 1).min(n);
        for i in lo..hi {
            triplets.push((i, j, 1.0 + (i + j) as f64 * 0.01));
        }
    }
    Matrix::from_triplets(n, n, &triplets).unwrap()
}

/// Random matrix from a linear congruential generator
fn random(n: usize, density: f64, seed: u64) -> Matrix<f64> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    let mut triplets = Vec::new();
    for j in 0..n {
        for i in 0..n {
            if next() < density {
                triplets.push((i, j, next() * 10.0));
            }
        }
    }
    Matrix::from_triplets(n, n, &triplets).unwrap()
}

fn bench_against_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("plus_times");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));

    for n in [100, 400, 1000] {
        let a = random(n, 0.02, 42);
        let b = random(n, 0.02, 43);
        group.throughput(Throughput::Elements((a.nvals() + b.nvals()) as u64));

        group.bench_with_input(BenchmarkId::new("parallel", n), &n, |bencher, _| {
            let config = MultiplyConfig::default();
            bencher.iter(|| multiply_with_config(black_box(&a), black_box(&b), &plus_times(), None, &config))
        });
        group.bench_with_input(BenchmarkId::new("reference", n), &n, |bencher, _| {
            bencher.iter(|| reference_multiply(black_box(&a), black_box(&b), &plus_times(), None))
        });

        let a_sprs = to_sprs(&a).unwrap().to_csr();
        let b_sprs = to_sprs(&b).unwrap().to_csr();
        group.bench_with_input(BenchmarkId::new("sprs", n), &n, |bencher, _| {
            bencher.iter(|| black_box(&a_sprs) * black_box(&b_sprs))
        });
    }
    group.finish();
}

fn bench_masked(c: &mut Criterion) {
    let mut group = c.benchmark_group("masked");
    group.sample_size(20);

    let n = 2000;
    let a = banded(n, 8);
    let mask_matrix = banded(n, 2);

    for complement in [false, true] {
        let mask = Mask::structural(&mask_matrix, complement).unwrap();
        let label = if complement { "complement" } else { "structural" };
        group.bench_function(label, |bencher| {
            let config = MultiplyConfig::default();
            bencher.iter(|| multiply_with_config(black_box(&a), black_box(&a), &plus_times(), Some(&mask), &config))
        });
    }
    group.bench_function("unmasked", |bencher| {
        let config = MultiplyConfig::default();
        bencher.iter(|| multiply_with_config(black_box(&a), black_box(&a), &plus_times(), None, &config))
    });
    group.finish();
}

fn bench_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("threads");
    group.sample_size(10);

    let a = random(1500, 0.01, 7);
    for threads in [1, 2, 4, num_cpus::get()] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |bencher, &threads| {
            let config = MultiplyConfig::with_threads(threads);
            bencher.iter(|| multiply_with_config(black_box(&a), black_box(&a), &min_plus(), None, &config))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_against_reference, bench_masked, bench_thread_scaling);
criterion_main!(benches);
