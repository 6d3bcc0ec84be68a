//! Benchmarks for the ladder low-pass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use thicc_dsp::dsp::filter::LadderFilter;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Fixed cutoff: coefficients computed once
        let mut filter = LadderFilter::new(1_000.0, 0.5);
        filter.prepare(SAMPLE_RATE as f32);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });

        // Per-sample cutoff: coefficient update every sample
        let cutoffs: Vec<f32> = (0..size)
            .map(|i| 200.0 + 4_000.0 * i as f32 / size as f32)
            .collect();
        let mut filter = LadderFilter::new(1_000.0, 0.9);
        filter.prepare(SAMPLE_RATE as f32);
        group.bench_with_input(BenchmarkId::new("modulated", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render_modulated(black_box(&mut buffer), black_box(&cutoffs));
            })
        });
    }

    group.finish();
}
