use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use note_core::{ExtractorConfig, Image};
use note_fast::{CornerDetector, FastDetector, KeypointRefinement};

/// Create a banknote-like benchmark image: gradient, fine print and engraved blocks
fn create_benchmark_image(width: usize, height: usize, complexity: &str) -> Image {
    match complexity {
        "flat" => Image::filled(width, height, 128),
        "blocks" => Image::from_fn(width, height, |x, y| {
            let side = 6 + ((x / 24) * 5 + (y / 24) * 3) % 12;
            if x % 24 < side && y % 24 < side { 210 } else { 40 }
        }),
        _ => Image::from_fn(width, height, |x, y| {
            let gradient = (x * 60 / width.max(1)) as u8;
            let print = if (x / 3 + y / 5) % 4 == 0 { 70 } else { 0 };
            let block = if (x / 40 + y / 30) % 3 == 0 { 50 } else { 0 };
            60u8.saturating_add(gradient).saturating_add(print).saturating_add(block)
        }),
    }
}

fn create_test_config(width: usize, height: usize) -> ExtractorConfig {
    ExtractorConfig {
        working_width: width,
        working_height: height,
        n_threads: 1,
        ..ExtractorConfig::default()
    }
}

/// Benchmark full multi-scale detection
fn bench_full_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_detection");
    let sizes = [(400, 200), (800, 400)];
    let complexities = ["flat", "blocks", "realistic"];

    for &(width, height) in &sizes {
        for complexity in &complexities {
            let detector = FastDetector::new(create_test_config(width, height)).unwrap();
            let img = create_benchmark_image(width, height, complexity);

            group.bench_with_input(
                BenchmarkId::new(format!("{}x{}", width, height), complexity),
                &(detector, img),
                |b, (detector, img)| b.iter(|| black_box(detector.detect(black_box(img)).unwrap())),
            );
        }
    }

    group.finish();
}

/// Benchmark individual pipeline stages on the base level
fn bench_pipeline_stages(c: &mut Criterion) {
    let img = create_benchmark_image(800, 400, "realistic");
    let mut group = c.benchmark_group("pipeline_stages");

    group.bench_function("detect_corners", |b| {
        b.iter(|| black_box(CornerDetector::detect_corners(black_box(&img), 20, 31)))
    });

    let corners = CornerDetector::detect_corners(&img, 20, 31);
    group.bench_function("suppress_non_maxima", |b| {
        b.iter(|| black_box(KeypointRefinement::suppress_non_maxima(black_box(&corners), 800, 400)))
    });

    group.bench_function("orientation", |b| {
        b.iter(|| {
            for c in corners.iter().take(200) {
                black_box(KeypointRefinement::compute_orientation(&img, c.x, c.y, 31));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_full_detection, bench_pipeline_stages);
criterion_main!(benches);
