//! Benchmarks for the tanh drive, direct and oversampled.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use thicc_dsp::dsp::distortion::{drive_gain, saturate_buffer, DriveStage};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 * 0.05).sin() * 0.8)
            .collect();
        let mut buffer = input.clone();

        group.bench_with_input(BenchmarkId::new("tanh", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                saturate_buffer(black_box(&mut buffer), drive_gain(0.7));
            })
        });

        // Two half-band chains on top of twice the tanh calls
        let mut drive = DriveStage::new();
        drive.prepare(size);
        drive.set_drive(0.7);
        group.bench_with_input(BenchmarkId::new("oversampled", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                drive.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
