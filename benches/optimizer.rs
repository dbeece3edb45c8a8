use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use ndarray::Array1;
use ndarray::Array2;
use perfstats::portfolio::efficient_frontier;
use perfstats::portfolio::max_sharpe_weights;

fn universe(n: usize) -> (Array1<f64>, Array2<f64>) {
  let er = Array1::linspace(0.03, 0.12, n);
  let vol = Array1::linspace(0.05, 0.25, n);
  let cov = Array2::from_shape_fn((n, n), |(i, j)| {
    let rho = if i == j { 1.0 } else { 0.3 };
    rho * vol[i] * vol[j]
  });
  (er, cov)
}

fn bench_frontier(c: &mut Criterion) {
  let mut group = c.benchmark_group("EfficientFrontier");

  for n in [4, 8, 16] {
    let (er, cov) = universe(n);
    group.bench_with_input(BenchmarkId::new("assets", n), &n, |b, _| {
      b.iter(|| black_box(efficient_frontier(25, er.view(), cov.view())))
    });
  }

  group.finish();
}

fn bench_max_sharpe(c: &mut Criterion) {
  let mut group = c.benchmark_group("MaxSharpe");

  for n in [4, 8] {
    let (er, cov) = universe(n);
    group.bench_with_input(BenchmarkId::new("assets", n), &n, |b, _| {
      b.iter(|| black_box(max_sharpe_weights(er.view(), cov.view(), 0.02)))
    });
  }

  group.finish();
}

criterion_group!(benches, bench_frontier, bench_max_sharpe);
criterion_main!(benches);
