//! Benchmarks for the ADSR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use thicc_dsp::dsp::envelope::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2);
        env.set_sample_rate(SAMPLE_RATE as f32);
        group.bench_with_input(BenchmarkId::new("adsr", size), &size, |b, _| {
            b.iter(|| {
                // Retrigger so the attack and decay branches stay hot
                env.note_on();
                env.render(black_box(&mut buffer));
            })
        });

        // Squared output as used for amplitude
        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2);
        env.set_sample_rate(SAMPLE_RATE as f32);
        group.bench_with_input(BenchmarkId::new("shaped", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                for sample in buffer.iter_mut() {
                    *sample = env.next_shaped();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
