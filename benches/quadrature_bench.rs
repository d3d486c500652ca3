//! Benchmarks for the rule evaluator and the adaptive drivers.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quadra_adaptive::{
    integrate, integrate_smooth, integrate_with_breakpoints, ExtrapolationTable,
    IntegrationOptions,
};
use quadra_rules::{GaussKronrodRule, Plain, RuleOrder};

fn bench_rule_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_evaluate");
    let f = Plain::new(|x: f64| (3.0 * x).cos() * (-x).exp());

    for order in RuleOrder::ALL {
        let rule = GaussKronrodRule::new(order);
        group.bench_with_input(
            BenchmarkId::new("cos_exp", order.kronrod_points()),
            &order,
            |b, _| b.iter(|| black_box(rule.evaluate(&f, black_box(0.0), black_box(2.0)))),
        );
    }

    group.finish();
}

fn bench_endpoint_singularity(c: &mut Criterion) {
    let mut group = c.benchmark_group("inverse_sqrt");
    let f = Plain::new(|x: f64| 1.0 / x.sqrt());

    // Extrapolation against plain bisection at the same tolerance
    for tol in [1e-6, 1e-8, 1e-10] {
        let opts = IntegrationOptions::new(tol, tol);
        group.bench_with_input(BenchmarkId::new("qags", tol), &opts, |b, o| {
            b.iter(|| black_box(integrate(&f, 0.0, 1.0, o)))
        });
        group.bench_with_input(BenchmarkId::new("qag", tol), &opts, |b, o| {
            b.iter(|| black_box(integrate_smooth(&f, 0.0, 1.0, o)))
        });
    }

    group.finish();
}

fn bench_smooth_peak(c: &mut Criterion) {
    let mut group = c.benchmark_group("lorentzian");
    group.sample_size(50);

    let f = Plain::new(|x: f64| 1.0 / (1.0 + x * x));
    for half_width in [10.0, 1000.0, 100_000.0] {
        let opts = IntegrationOptions::new(1e-9, 1e-9);
        group.bench_with_input(
            BenchmarkId::new("qags", half_width),
            &half_width,
            |b, &w| b.iter(|| black_box(integrate(&f, -w, w, &opts))),
        );
    }

    group.finish();
}

fn bench_breakpoints(c: &mut Criterion) {
    let f = Plain::new(|x: f64| x.powi(3) * ((x * x - 1.0) * (x * x - 2.0)).abs().ln());
    let points = [0.0, 1.0, 2f64.sqrt(), 3.0];
    let opts = IntegrationOptions::new(0.0, 1e-3);

    c.bench_function("qagp_log_singularities", |b| {
        b.iter(|| black_box(integrate_with_breakpoints(&f, &points, &opts)))
    });
}

fn bench_epsilon_table(c: &mut Criterion) {
    let sums: Vec<f64> = (1..=40)
        .scan(0.0, |sum, k: i32| {
            *sum += f64::from(if k % 2 == 1 { 1 } else { -1 }) / f64::from(k);
            Some(*sum)
        })
        .collect();

    c.bench_function("epsilon_alternating_harmonic", |b| {
        b.iter(|| {
            let mut table = ExtrapolationTable::<f64>::new();
            for &s in &sums {
                table.append(s);
                black_box(table.extrapolate());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_rule_orders,
    bench_endpoint_singularity,
    bench_smooth_peak,
    bench_breakpoints,
    bench_epsilon_table
);

criterion_main!(benches);
