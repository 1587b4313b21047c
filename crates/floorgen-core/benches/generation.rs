use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use floorgen_core::prelude::*;

const STATION_JSON: &str = include_str!("../../../data/station_catalog.json");

fn bench_generate(c: &mut Criterion) {
    let catalog = std::sync::Arc::new(RoomCatalog::from_json(STATION_JSON).unwrap());
    let mut group = c.benchmark_group("generate_floor");

    for budget in [10u32, 20, 40] {
        group.bench_with_input(BenchmarkId::from_parameter(budget), &budget, |b, &budget| {
            let config = GeneratorConfig {
                door_budget: budget,
                cache_layouts: false,
                ..Default::default()
            };
            let mut generator = LayoutGenerator::new(catalog.clone(), config, MemoryFloorStore::new(12345));
            b.iter(|| black_box(generator.generate(0).unwrap()));
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let catalog = RoomCatalog::from_json(STATION_JSON).unwrap();
    let mut generator = LayoutGenerator::new(catalog, GeneratorConfig::default(), MemoryFloorStore::new(12345));
    generator.generate(0).unwrap();

    c.bench_function("replay_floor", |b| {
        b.iter(|| black_box(generator.generate(0).unwrap()));
    });
}

criterion_group!(benches, bench_generate, bench_replay);
criterion_main!(benches);
