use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wfc_core::{RuleSet, TileId, TileRule, Wfc, WfcConfig};

// Land, coast and sea; never dead-ends, so runs measure pure collapse cost.
fn land_coast_sea() -> RuleSet {
    RuleSet::new([
        (TileId(0), TileRule::new(3).allow_all_sides([0, 1])),
        (TileId(1), TileRule::new(1).allow_all_sides([0, 1, 2])),
        (TileId(2), TileRule::new(2).allow_all_sides([1, 2])),
    ])
    .unwrap_or_default()
}

// Tile 1 cannot touch itself, which forces occasional backtracking.
fn contentious() -> RuleSet {
    RuleSet::new([
        (TileId(0), TileRule::new(2).allow_all_sides([0, 1])),
        (TileId(1), TileRule::new(1).allow_all_sides([0, 2])),
        (TileId(2), TileRule::new(2).allow_all_sides([1, 2])),
    ])
    .unwrap_or_default()
}

fn bench_full_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("WFC full run");

    for (name, rules) in [("land_coast_sea", land_coast_sea()), ("contentious", contentious())] {
        for size in [8_usize, 16, 32] {
            group.throughput(Throughput::Elements((size * size) as u64));
            group.bench_with_input(
                BenchmarkId::new(name, format!("{size}x{size}")),
                &size,
                |b, &size| {
                    b.iter(|| {
                        let config = WfcConfig::builder()
                            .dimensions(size, size)
                            .seed(42)
                            .max_backtracks(10_000)
                            .build();
                        let mut wfc = Wfc::new(config, rules.clone());
                        if wfc.initialize().is_ok() {
                            black_box(wfc.run().ok());
                        }
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_full_runs);
criterion_main!(benches);
