use std::collections::BTreeMap;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use paramspace::prelude::*;
use paramspace::reduce::reduce;

/// A gradient-boosting style model: a handful of conditioned parameters, a
/// union-typed feature fraction, and two forbidden combinations.
fn boosting_model() -> Arc<Model> {
    let model = Model::builder()
        .param("loss", Param::string(["log_loss", "exponential"]))
        .param("learning_rate", Param::FloatInterval(Interval::new().lower(0.0)))
        .param("n_estimators", Param::IntInterval(Interval::new().lower(1)))
        .param("subsample", Param::FloatInterval(Interval::new().lower(0.0).upper(1.0)))
        .param("criterion", Param::string(["friedman_mse", "squared_error"]))
        .param("max_depth", Param::union([Param::None, Param::Int]))
        .param(
            "max_features",
            Param::union([Param::string(["sqrt", "log2"]), Param::Float, Param::None]),
        )
        .param("warm_start", Param::Bool)
        .param("n_iter_no_change", Param::union([Param::None, Param::Int]))
        .param("validation_fraction", Param::Float)
        .param("tol", Param::Float)
        .condition(Condition::greater_than("validation_fraction", "n_iter_no_change", 5))
        .condition(Condition::greater_than("tol", "n_iter_no_change", 5))
        .condition(
            Condition::or([
                Condition::equals("max_depth", "criterion", "friedman_mse"),
                Condition::less_than("max_depth", "subsample", 0.5),
            ])
            .unwrap(),
        )
        .forbidden(ForbiddenClause::equals("loss", "exponential") & ForbiddenClause::equals("warm_start", true))
        .forbidden(ForbiddenClause::equals("criterion", "squared_error") & ForbiddenClause::equals("max_features", "log2"))
        .build()
        .unwrap();
    Arc::new(model)
}

fn boosting_distributions() -> BTreeMap<String, Distribution> {
    [
        ("loss", Distribution::categorical(["log_loss", "exponential"])),
        ("learning_rate", UniformFloatDistribution::new(1e-3, 1.0).log().into()),
        ("n_estimators", UniformIntDistribution::new(10, 1000).log().into()),
        ("subsample", Distribution::float(0.1, 1.0)),
        ("criterion", Distribution::categorical(["friedman_mse", "squared_error"])),
        ("max_depth", Distribution::int(2, 12)),
        (
            "max_features",
            Distribution::union([Distribution::categorical(["sqrt", "log2"]), Distribution::float(0.1, 1.0)]),
        ),
        ("warm_start", Distribution::boolean()),
        ("n_iter_no_change", Distribution::int(1, 20)),
        ("validation_fraction", Distribution::float(0.05, 0.3)),
    ]
    .into_iter()
    .map(|(name, dist)| (name.to_owned(), dist))
    .collect()
}

fn bench_reduce(c: &mut Criterion) {
    let model = boosting_model();
    let full = boosting_distributions();
    let partial: BTreeMap<String, Distribution> = full
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "criterion" | "n_iter_no_change"))
        .map(|(name, dist)| (name.clone(), dist.clone()))
        .collect();

    let mut group = c.benchmark_group("reduce");
    for (label, dists) in [("full", &full), ("partial", &partial)] {
        group.bench_with_input(BenchmarkId::new("bound", label), dists, |b, dists| {
            b.iter(|| reduce(&model, dists));
        });
    }
    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let sampler = Sampler::with_seed(boosting_model(), boosting_distributions(), 42)
        .unwrap();

    let mut group = c.benchmark_group("sample");
    for count in [1, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("count", count), &count, |b, &count| {
            b.iter(|| sampler.sample(count));
        });
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let model = boosting_model();
    let mut sampler = Sampler::with_seed(Arc::clone(&model), boosting_distributions(), 42)
        .unwrap();
    let records = sampler.to_records().unwrap();

    c.bench_function("restore", |b| {
        b.iter(|| sampler.restore(&records));
    });
}

criterion_group!(benches, bench_reduce, bench_sample, bench_rebuild);
criterion_main!(benches);
