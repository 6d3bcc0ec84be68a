//! Benchmarks for the PolyBLEP unison saw and the sine sub.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use thicc_dsp::dsp::oscillator::{SubOscillator, UnisonOscillator};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let increment = 110.0 / SAMPLE_RATE;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Cost grows with the stack: one PolyBLEP correction per saw
        for voices in [1, 3, 5] {
            let mut osc = UnisonOscillator::new();
            osc.set_voices(voices);
            osc.set_detune(0.5);
            group.bench_with_input(
                BenchmarkId::new(format!("unison_{}", voices), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        for sample in buffer.iter_mut() {
                            *sample = osc.next_sample(black_box(increment));
                        }
                    })
                },
            );
        }

        let mut sub = SubOscillator::new();
        group.bench_with_input(BenchmarkId::new("sub", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = sub.next_sample(black_box(increment * 0.5));
                }
            })
        });
    }

    group.finish();
}
