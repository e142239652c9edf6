use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_qr_web::utils::binarization::{
    ADAPTIVE_WINDOW, adaptive_binarize, histogram_binarize, threshold_binarize,
};
use rust_qr_web::utils::grayscale::SamplingSurface;

const SIZES: [(usize, usize); 3] = [(100, 100), (640, 480), (2048, 1024)];

/// Left-to-right lighting gradient with a checkerboard on top
fn uneven_surface(width: usize, height: usize) -> SamplingSurface {
    let luma = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let base = 60 + (x * 160 / width) as u8;
            if (x / 8 + y / 8) % 2 == 0 { base / 2 } else { base }
        })
        .collect();
    SamplingSurface::from_luma(luma, width, height)
}

fn bench_histogram_binarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram_binarize");
    for (width, height) in SIZES {
        let surface = uneven_surface(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &surface,
            |b, surface| b.iter(|| histogram_binarize(black_box(surface))),
        );
    }
    group.finish();
}

fn bench_adaptive_binarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("adaptive_binarize");
    for (width, height) in SIZES {
        let surface = uneven_surface(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &surface,
            |b, surface| b.iter(|| adaptive_binarize(black_box(surface), ADAPTIVE_WINDOW)),
        );
    }
    group.finish();
}

fn bench_threshold_binarize_medium(c: &mut Criterion) {
    let surface = uneven_surface(640, 480);
    c.bench_function("threshold_binarize_640x480", |b| {
        b.iter(|| threshold_binarize(black_box(&surface), black_box(128)))
    });
}

criterion_group!(
    benches,
    bench_histogram_binarize,
    bench_adaptive_binarize,
    bench_threshold_binarize_medium
);
criterion_main!(benches);
