use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lbpface::{compute_descriptor, extract_batch, spatial_histogram, Image, PipelineConfig, Recognizer, RuntimeConfig};

fn textured_face(size: u32, seed: u32) -> Image {
    Image::from_fn(size, size, move |x, y| {
        ((x * (3 + seed) + y * 7 + (x * y) % (11 + seed)) % 256) as u8
    })
}

fn setup_benchmark_recognizer() -> Recognizer {
    let mut builder = Recognizer::builder();
    for seed in 0..4 {
        builder = builder
            .add_sample(textured_face(80, seed), "first")
            .unwrap()
            .add_sample(textured_face(80, seed + 10), "second")
            .unwrap();
    }
    builder.build().unwrap()
}

fn bench_descriptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("Descriptor");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for size in [80u32, 160, 320] {
        let image = textured_face(size, 1);
        group.bench_with_input(BenchmarkId::new("radius_1", size), &image, |b, image| {
            b.iter(|| compute_descriptor(black_box(image), 1, 8).unwrap())
        });
    }

    let image = textured_face(160, 1);
    group.bench_function("radius_2_16_neighbours", |b| {
        b.iter(|| compute_descriptor(black_box(&image), 2, 16).unwrap())
    });

    group.finish();
}

fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("Spatial histogram");
    group.sample_size(50);

    let map = compute_descriptor(&textured_face(80, 2), 1, 8).unwrap();
    for grid in [4usize, 8, 16] {
        group.bench_with_input(BenchmarkId::new("grid", grid), &grid, |b, &grid| {
            b.iter(|| spatial_histogram(black_box(&map), grid, grid).unwrap())
        });
    }

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch extraction");
    group.sample_size(20);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let faces: Vec<Image> = (0..32).map(|seed| textured_face(120, seed)).collect();
    let config = PipelineConfig::default();

    // Test different runtime configurations
    for threads in [1usize, 2, 4] {
        let runtime = RuntimeConfig { worker_threads: threads };
        group.bench_with_input(BenchmarkId::new("threads", threads), &runtime, |b, runtime| {
            b.iter(|| extract_batch(black_box(&faces), &config, runtime).unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let recognizer = setup_benchmark_recognizer();
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);

    let face = textured_face(96, 3);
    group.bench_function("predict_face", |b| {
        b.iter(|| recognizer.predict(black_box(&face)).unwrap().len())
    });

    let features = recognizer.extract_features(&face).unwrap();
    group.bench_function("predict_features", |b| {
        b.iter(|| recognizer.predict_index(black_box(&features)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_descriptor,
    bench_histogram,
    bench_extraction,
    bench_prediction
);
criterion_main!(benches);
