//! Criterion benchmarks for component enumeration and despeckling on a
//! page-sized noise image.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use scanfix_core::CancelToken;
use scanfix_region::{ConnCompEraser, Connectivity, DespeckleLevel, DespeckleOptions, despeckle};
use scanfix_test::random_image;

fn bench_enumerate(c: &mut Criterion) {
    let page = random_image(2480, 600, 0.2).expect("page");
    let mut group = c.benchmark_group("enumerate_components");
    for conn in [Connectivity::FourWay, Connectivity::EightWay] {
        group.bench_function(format!("{conn:?}"), |b| {
            b.iter(|| {
                let count = ConnCompEraser::new(black_box(&page), conn).count();
                black_box(count);
            });
        });
    }
    group.finish();
}

fn bench_despeckle_levels(c: &mut Criterion) {
    let page = random_image(2480, 600, 0.05).expect("page");
    let cancel = CancelToken::new();
    let mut group = c.benchmark_group("despeckle");
    for level in [DespeckleLevel::Cautious, DespeckleLevel::Aggressive] {
        let opts = DespeckleOptions::default().with_level(level);
        group.bench_function(format!("{level:?}"), |b| {
            b.iter(|| {
                let out = despeckle(black_box(&page), &opts, &cancel).expect("despeckle");
                black_box(out);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enumerate, bench_despeckle_levels);
criterion_main!(benches);
