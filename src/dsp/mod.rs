//! Low-level DSP primitives used by the synth voice.
//!
//! These components are allocation-free and realtime-safe once prepared, making
//! them safe to embed directly inside voice structs. They intentionally stay
//! focused on the signal-processing math so the voice can layer on note
//! lifecycle and modulation routing.

/// Tanh drive stage running at twice the sample rate.
pub mod distortion;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// 24 dB/octave resonant ladder low-pass.
pub mod filter;
/// Portamento between note frequencies.
pub mod glide;
/// Sine LFO for cutoff modulation.
pub mod lfo;
/// Combines modulation sources into a filter cutoff and amp gain.
pub mod modulate;
/// Band-limited unison sawtooth stack and sine sub-oscillator.
pub mod oscillator;
/// 2x half-band polyphase resampler.
pub mod oversample;
/// Exponential parameter smoothing.
pub mod smooth;

pub use envelope::EnvelopeState;
