//! Benchmarks for team execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use teamflow::config::AgencyConfig;
use teamflow::context::Context;
use teamflow::factory::TeamFactory;

fn factory() -> TeamFactory {
    TeamFactory::with_mocks(AgencyConfig::new().with_daily_limit(u32::MAX))
        .expect("default configuration is valid")
}

fn team_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let factory = factory();

    c.bench_function("base_pipeline", |b| {
        b.iter(|| {
            let ctx = runtime
                .block_on(factory.run_base_pipeline(Some(Context::new())))
                .expect("base run");
            black_box(ctx)
        });
    });

    c.bench_function("client_pipeline", |b| {
        b.iter(|| {
            let ctx = runtime
                .block_on(factory.run_client_pipeline(black_box("Acme Clinic"), None))
                .expect("client run");
            black_box(ctx)
        });
    });

    c.bench_function("create_client_team", |b| {
        b.iter(|| black_box(factory.create_client_team("Acme Clinic").expect("valid id")));
    });
}

criterion_group!(benches, team_benchmark);
criterion_main!(benches);
