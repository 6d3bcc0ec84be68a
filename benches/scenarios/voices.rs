//! Benchmarks for complete voice renders.
//!
//! A lone voice at default settings, the heaviest single-voice patch, and the
//! full pool playing a chord.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use thicc_dsp::{
    io::AudioBuffer,
    params::{ParamId, SynthParams, VoiceParams},
    synth::{
        message::{NoMessages, SynthMessage},
        PolySynth, SynthVoice, PITCH_WHEEL_CENTER,
    },
    NUM_VOICES,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn heavy_params() -> VoiceParams {
    let mut params = VoiceParams::default();
    params.unison_voices = 5;
    params.unison_detune = 0.6;
    params.sub_mix = 0.5;
    params.lfo_amount = 0.4;
    params.drive = 0.8;
    params.resonance = 0.9;
    params
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut output = AudioBuffer::new(2, size);

        let mut voice = SynthVoice::new();
        voice.prepare_to_play(SAMPLE_RATE, size, 2);
        voice.start_note(45, 0.8, PITCH_WHEEL_CENTER);
        group.bench_with_input(BenchmarkId::new("default_voice", size), &size, |b, _| {
            b.iter(|| {
                output.clear();
                voice.render_next_block(black_box(&mut output), 0, size);
            })
        });

        let mut voice = SynthVoice::with_params(&heavy_params());
        voice.prepare_to_play(SAMPLE_RATE, size, 2);
        voice.start_note(45, 0.8, PITCH_WHEEL_CENTER);
        group.bench_with_input(BenchmarkId::new("heavy_voice", size), &size, |b, _| {
            b.iter(|| {
                output.clear();
                voice.render_next_block(black_box(&mut output), 0, size);
            })
        });

        // Every voice busy, parameters snapshotted each block
        let params = Arc::new(SynthParams::new());
        params.set(ParamId::UnisonVoices, 3.0);
        params.set(ParamId::Drive, 0.5);
        let mut synth = PolySynth::new(NoMessages, params);
        synth.prepare_to_play(SAMPLE_RATE, size, 2);
        for note in (0..NUM_VOICES as u8).map(|i| 48 + i * 3) {
            synth.handle_message(SynthMessage::NoteOn { note, velocity: 100 });
        }
        group.bench_with_input(BenchmarkId::new("poly_full", size), &size, |b, _| {
            b.iter(|| {
                output.clear();
                synth.render_block(black_box(&mut output), 0, size);
            })
        });
    }

    group.finish();
}
