use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_zncc::prelude::*;
use cv_zncc::zncc::{ComputeBackend, Params, Windowing, Zncc};

/// Deterministic textured buffer so every correlation window has variance.
fn textured(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}

fn shifted_pair(width: u32, height: u32, shift: u32, seed: u32) -> StereoPair {
    let master_width = width + shift;
    let master = textured((master_width * height) as usize, seed);

    let mut left = Vec::with_capacity((width * height) as usize);
    let mut right = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        for x in 0..width {
            left.push(master[(y * master_width + x) as usize]);
            right.push(master[(y * master_width + x + shift) as usize]);
        }
    }

    StereoPair::new(
        GrayByteImage::from_raw(width, height, left),
        GrayByteImage::from_raw(width, height, right),
    )
    .unwrap()
}

fn zncc_bench(c: &mut Criterion) {
    // Build the synthetic frame
    let pair = shifted_pair(128, 96, 4, 0x5eed);
    let range = DisparityRange::new(0, 16).unwrap();

    // Build both engine variants
    let sequential = Zncc::new(Params {
        correlation_window_size: (8, 8),
        windowing: Windowing::Exact,
        backend: ComputeBackend::Sequential,
    })
    .unwrap();

    let parallel = Zncc::new(Params {
        correlation_window_size: (8, 8),
        windowing: Windowing::Exact,
        backend: ComputeBackend::RowParallel,
    })
    .unwrap();

    // Benchmark one directional pass per backend
    c.bench_function("zncc sequential 128x96", |b| {
        b.iter(|| sequential.compute(black_box(&pair.left), black_box(&pair.right), range))
    });
    c.bench_function("zncc row-parallel 128x96", |b| {
        b.iter(|| parallel.compute(black_box(&pair.left), black_box(&pair.right), range))
    });

    // Benchmark the whole pipeline
    let pipeline = Pipeline::new(PipelineConfig {
        correlation_window_size: (8, 8),
        min_disparity: 0,
        max_disparity: 16,
        cross_check_threshold: 8,
        ..PipelineConfig::default()
    })
    .unwrap();

    c.bench_function("pipeline 128x96", |b| b.iter(|| pipeline.run(black_box(&pair))));
}

criterion_group!(benches, zncc_bench);
criterion_main!(benches);
