//! Criterion benchmarks for brick morphology and hit-miss matching on a
//! page-sized noise image.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use scanfix_core::BWColor;
use scanfix_morph::{Brick, close_brick, dilate_brick, hit_miss_match, open_brick};
use scanfix_test::random_image;

/// Dilation cost should grow with log(brick size), not brick size.
fn bench_dilate_brick_sizes(c: &mut Criterion) {
    let page = random_image(2480, 600, 0.05).expect("page");
    let mut group = c.benchmark_group("dilate_brick");
    for size in [3u32, 9, 31, 101] {
        let brick = Brick::from_size(size, size).expect("brick");
        group.bench_function(format!("{size}x{size}"), |b| {
            b.iter(|| {
                let out = dilate_brick(black_box(&page), &brick, page.rect(), BWColor::White)
                    .expect("dilate");
                black_box(out);
            });
        });
    }
    group.finish();
}

/// The close/open pair used to fuse text lines before dewarping.
fn bench_line_fusing(c: &mut Criterion) {
    let page = random_image(2480, 600, 0.1).expect("page");
    let close = Brick::from_size(30, 3).expect("brick");
    let open = Brick::from_size(50, 5).expect("brick");
    c.bench_function("close_then_open", |b| {
        b.iter(|| {
            let closed = close_brick(black_box(&page), &close, page.rect(), BWColor::White)
                .expect("close");
            let opened = open_brick(&closed, &open, closed.rect(), BWColor::White).expect("open");
            black_box(opened);
        });
    });
}

fn bench_hit_miss(c: &mut Criterion) {
    let page = random_image(2480, 600, 0.5).expect("page");
    let hits: Vec<_> = (-2..=2).flat_map(|x| (-3..=0).map(move |y| (x, y))).collect();
    let misses: Vec<_> = (-2..=2).flat_map(|x| (1..=3).map(move |y| (x, y))).collect();
    c.bench_function("hit_miss_5x7", |b| {
        b.iter(|| {
            let out = hit_miss_match(black_box(&page), BWColor::White, &hits, &misses)
                .expect("hit-miss");
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_dilate_brick_sizes, bench_line_fusing, bench_hit_miss);
criterion_main!(benches);
