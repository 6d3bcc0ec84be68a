//! Lock-free parameter store shared between the UI and audio threads.

use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::envelope::{EnvelopeParams, MAX_ENV_TIME, MIN_ENV_TIME};
use crate::dsp::modulate::ModAmounts;
use crate::dsp::oscillator::SubOctave;
use crate::MAX_UNISON;

/*
Parameter Store
===============

The UI (or host automation) writes, the audio thread reads. Every parameter
lives in its own atomic cell:

    UI thread                       audio thread
    ---------                       ------------
    params.set(Cutoff, 2400.0) ──→  [AtomicF32]  ──→ params.snapshot()
                                                       once per block

Each cell is single-writer / single-reader with latest-value-wins semantics.
A reader always sees a complete f32 (no tearing), but there is no ordering
between cells: a snapshot taken mid-edit may mix the old resonance with the
new cutoff. For a synth that is harmless; the next block catches up.

Out-of-range writes are clamped, never rejected. NaN is replaced by the
parameter's default before clamping so it can never reach filter state.


Skewed Ranges
-------------

Frequencies and times are perceived logarithmically. A linear knob over
20..20000 Hz would spend 90 % of its travel above 2 kHz. Ranges with a skew
factor below 1 stretch the low end:

    value      = min + (max − min) · normalized^(1/skew)
    normalized = ((value − min) / (max − min))^skew

    cutoff, skew 0.3:
      normalized 0.25 → ~200 Hz
      normalized 0.50 → ~2 kHz
      normalized 1.00 → 20 kHz
*/

/// An `f32` stored in an `AtomicU32`.
///
/// Uses relaxed ordering: each cell stands alone, nothing is published
/// alongside it.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicF32 {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

/// Valid range, default and display skew of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub skew: f32,
}

impl ParamRange {
    pub const fn linear(min: f32, max: f32, default: f32) -> Self {
        Self {
            min,
            max,
            default,
            skew: 1.0,
        }
    }

    pub const fn skewed(min: f32, max: f32, default: f32, skew: f32) -> Self {
        Self {
            min,
            max,
            default,
            skew,
        }
    }

    /// Clamp into range; NaN becomes the default.
    pub fn sanitize(&self, value: f32) -> f32 {
        crate::sanitize(value, self.min, self.max, self.default)
    }

    /// Map a value to 0..=1 knob travel.
    pub fn to_normalized(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        let proportion = (self.sanitize(value) - self.min) / span;
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Map 0..=1 knob travel back to a value.
    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let normalized = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };
        let proportion = if self.skew == 1.0 {
            normalized
        } else {
            normalized.powf(1.0 / self.skew)
        };
        self.min + (self.max - self.min) * proportion
    }
}

const LOG_SKEW: f32 = 0.3;

pub const CUTOFF_RANGE: ParamRange = ParamRange::skewed(20.0, 20_000.0, 1_000.0, LOG_SKEW);
pub const RESONANCE_RANGE: ParamRange = ParamRange::linear(0.0, 1.0, 0.5);
pub const LFO_RATE_RANGE: ParamRange = ParamRange::skewed(0.01, 20.0, 2.0, LOG_SKEW);
pub const GLIDE_RANGE: ParamRange = ParamRange::linear(0.0, 2.0, 0.0);
pub const UNISON_RANGE: ParamRange = ParamRange::linear(1.0, MAX_UNISON as f32, 1.0);
pub const SUB_OCTAVE_RANGE: ParamRange = ParamRange::linear(1.0, 2.0, 1.0);

const fn env_time(default: f32) -> ParamRange {
    ParamRange::skewed(MIN_ENV_TIME, MAX_ENV_TIME, default, LOG_SKEW)
}

const fn amount(default: f32) -> ParamRange {
    ParamRange::linear(0.0, 1.0, default)
}

/// Every parameter the voice reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Cutoff,
    Resonance,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    FilterAttack,
    FilterDecay,
    FilterSustain,
    FilterRelease,
    FilterEnvAmount,
    SubMix,
    SubOctave,
    LfoRate,
    LfoAmount,
    Drive,
    GlideTime,
    VelocityToFilter,
    VelocityToAmp,
    KeyTrack,
    UnisonVoices,
    UnisonDetune,
}

impl ParamId {
    pub const COUNT: usize = 22;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::Cutoff,
        ParamId::Resonance,
        ParamId::AmpAttack,
        ParamId::AmpDecay,
        ParamId::AmpSustain,
        ParamId::AmpRelease,
        ParamId::FilterAttack,
        ParamId::FilterDecay,
        ParamId::FilterSustain,
        ParamId::FilterRelease,
        ParamId::FilterEnvAmount,
        ParamId::SubMix,
        ParamId::SubOctave,
        ParamId::LfoRate,
        ParamId::LfoAmount,
        ParamId::Drive,
        ParamId::GlideTime,
        ParamId::VelocityToFilter,
        ParamId::VelocityToAmp,
        ParamId::KeyTrack,
        ParamId::UnisonVoices,
        ParamId::UnisonDetune,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn range(self) -> ParamRange {
        match self {
            ParamId::Cutoff => CUTOFF_RANGE,
            ParamId::Resonance => RESONANCE_RANGE,
            ParamId::AmpAttack => env_time(0.01),
            ParamId::AmpDecay => env_time(0.1),
            ParamId::AmpSustain => amount(0.8),
            ParamId::AmpRelease => env_time(0.1),
            ParamId::FilterAttack => env_time(0.01),
            ParamId::FilterDecay => env_time(0.2),
            ParamId::FilterSustain => amount(0.3),
            ParamId::FilterRelease => env_time(0.2),
            ParamId::FilterEnvAmount => amount(0.5),
            ParamId::SubMix => amount(0.5),
            ParamId::SubOctave => SUB_OCTAVE_RANGE,
            ParamId::LfoRate => LFO_RATE_RANGE,
            ParamId::LfoAmount => amount(0.0),
            ParamId::Drive => amount(0.0),
            ParamId::GlideTime => GLIDE_RANGE,
            ParamId::VelocityToFilter => amount(0.5),
            ParamId::VelocityToAmp => amount(0.7),
            ParamId::KeyTrack => amount(0.0),
            ParamId::UnisonVoices => UNISON_RANGE,
            ParamId::UnisonDetune => amount(0.0),
        }
    }

    /// Integer parameters snap to whole numbers when written.
    pub fn is_discrete(self) -> bool {
        matches!(self, ParamId::SubOctave | ParamId::UnisonVoices)
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamId::Cutoff => "Cutoff",
            ParamId::Resonance => "Resonance",
            ParamId::AmpAttack => "Amp Attack",
            ParamId::AmpDecay => "Amp Decay",
            ParamId::AmpSustain => "Amp Sustain",
            ParamId::AmpRelease => "Amp Release",
            ParamId::FilterAttack => "Filter Attack",
            ParamId::FilterDecay => "Filter Decay",
            ParamId::FilterSustain => "Filter Sustain",
            ParamId::FilterRelease => "Filter Release",
            ParamId::FilterEnvAmount => "Filter Env Amount",
            ParamId::SubMix => "Sub Mix",
            ParamId::SubOctave => "Sub Octave",
            ParamId::LfoRate => "LFO Rate",
            ParamId::LfoAmount => "LFO Amount",
            ParamId::Drive => "Drive",
            ParamId::GlideTime => "Glide",
            ParamId::VelocityToFilter => "Vel > Filter",
            ParamId::VelocityToAmp => "Vel > Amp",
            ParamId::KeyTrack => "Key Track",
            ParamId::UnisonVoices => "Unison Voices",
            ParamId::UnisonDetune => "Unison Detune",
        }
    }
}

/// Plain copy of every parameter, taken once per block by the audio thread.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoiceParams {
    pub cutoff: f32,
    pub resonance: f32,
    pub amp_env: EnvelopeParams,
    pub filter_env: EnvelopeParams,
    pub filter_env_amount: f32,
    pub sub_mix: f32,
    pub sub_octave: SubOctave,
    pub lfo_rate: f32,
    pub lfo_amount: f32,
    pub drive: f32,
    pub glide_time: f32,
    pub velocity_to_filter: f32,
    pub velocity_to_amp: f32,
    pub key_track: f32,
    pub unison_voices: usize,
    pub unison_detune: f32,
}

impl VoiceParams {
    pub fn mod_amounts(&self) -> ModAmounts {
        ModAmounts {
            filter_env: self.filter_env_amount,
            lfo: self.lfo_amount,
            velocity_to_filter: self.velocity_to_filter,
            velocity_to_amp: self.velocity_to_amp,
            key_track: self.key_track,
        }
    }
}

impl Default for VoiceParams {
    fn default() -> Self {
        SynthParams::new().snapshot()
    }
}

/// One atomic cell per parameter. Share with `Arc<SynthParams>`.
#[derive(Debug)]
pub struct SynthParams {
    values: [AtomicF32; ParamId::COUNT],
}

impl SynthParams {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicF32::new(ParamId::ALL[i].range().default)),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].get()
    }

    /// Publish a new value, clamped into the parameter's range.
    pub fn set(&self, id: ParamId, value: f32) {
        let mut value = id.range().sanitize(value);
        if id.is_discrete() {
            value = value.round();
        }
        self.values[id.index()].set(value);
    }

    pub fn get_normalized(&self, id: ParamId) -> f32 {
        id.range().to_normalized(self.get(id))
    }

    pub fn set_normalized(&self, id: ParamId, normalized: f32) {
        self.set(id, id.range().from_normalized(normalized));
    }

    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.values[id.index()].set(id.range().default);
        }
    }

    /// Publish every field of a snapshot, e.g. a loaded preset.
    pub fn apply(&self, params: &VoiceParams) {
        self.set(ParamId::Cutoff, params.cutoff);
        self.set(ParamId::Resonance, params.resonance);
        self.set(ParamId::AmpAttack, params.amp_env.attack);
        self.set(ParamId::AmpDecay, params.amp_env.decay);
        self.set(ParamId::AmpSustain, params.amp_env.sustain);
        self.set(ParamId::AmpRelease, params.amp_env.release);
        self.set(ParamId::FilterAttack, params.filter_env.attack);
        self.set(ParamId::FilterDecay, params.filter_env.decay);
        self.set(ParamId::FilterSustain, params.filter_env.sustain);
        self.set(ParamId::FilterRelease, params.filter_env.release);
        self.set(ParamId::FilterEnvAmount, params.filter_env_amount);
        self.set(ParamId::SubMix, params.sub_mix);
        self.set(ParamId::SubOctave, params.sub_octave.octaves() as f32);
        self.set(ParamId::LfoRate, params.lfo_rate);
        self.set(ParamId::LfoAmount, params.lfo_amount);
        self.set(ParamId::Drive, params.drive);
        self.set(ParamId::GlideTime, params.glide_time);
        self.set(ParamId::VelocityToFilter, params.velocity_to_filter);
        self.set(ParamId::VelocityToAmp, params.velocity_to_amp);
        self.set(ParamId::KeyTrack, params.key_track);
        self.set(ParamId::UnisonVoices, params.unison_voices as f32);
        self.set(ParamId::UnisonDetune, params.unison_detune);
    }

    /// Read every cell once. Realtime-safe.
    pub fn snapshot(&self) -> VoiceParams {
        VoiceParams {
            cutoff: self.get(ParamId::Cutoff),
            resonance: self.get(ParamId::Resonance),
            amp_env: EnvelopeParams::new(
                self.get(ParamId::AmpAttack),
                self.get(ParamId::AmpDecay),
                self.get(ParamId::AmpSustain),
                self.get(ParamId::AmpRelease),
            ),
            filter_env: EnvelopeParams::new(
                self.get(ParamId::FilterAttack),
                self.get(ParamId::FilterDecay),
                self.get(ParamId::FilterSustain),
                self.get(ParamId::FilterRelease),
            ),
            filter_env_amount: self.get(ParamId::FilterEnvAmount),
            sub_mix: self.get(ParamId::SubMix),
            sub_octave: SubOctave::from_selector(self.get(ParamId::SubOctave).round() as i32),
            lfo_rate: self.get(ParamId::LfoRate),
            lfo_amount: self.get(ParamId::LfoAmount),
            drive: self.get(ParamId::Drive),
            glide_time: self.get(ParamId::GlideTime),
            velocity_to_filter: self.get(ParamId::VelocityToFilter),
            velocity_to_amp: self.get(ParamId::VelocityToAmp),
            key_track: self.get(ParamId::KeyTrack),
            unison_voices: self.get(ParamId::UnisonVoices).round() as usize,
            unison_detune: self.get(ParamId::UnisonDetune),
        }
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn atomic_round_trips_bits() {
        let cell = AtomicF32::new(0.25);
        assert_eq!(cell.get(), 0.25);
        cell.set(-3.5);
        assert_eq!(cell.get(), -3.5);
        assert_eq!(cell.clone().get(), -3.5);
    }

    #[test]
    fn params_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SynthParams>();
    }

    #[test]
    fn defaults_match_parameter_layout() {
        let p = SynthParams::new().snapshot();
        assert_eq!(p.cutoff, 1_000.0);
        assert_eq!(p.resonance, 0.5);
        assert_eq!(p.amp_env, EnvelopeParams::new(0.01, 0.1, 0.8, 0.1));
        assert_eq!(p.filter_env, EnvelopeParams::new(0.01, 0.2, 0.3, 0.2));
        assert_eq!(p.filter_env_amount, 0.5);
        assert_eq!(p.sub_mix, 0.5);
        assert_eq!(p.sub_octave, SubOctave::One);
        assert_eq!(p.lfo_rate, 2.0);
        assert_eq!(p.lfo_amount, 0.0);
        assert_eq!(p.drive, 0.0);
        assert_eq!(p.glide_time, 0.0);
        assert_eq!(p.velocity_to_filter, 0.5);
        assert_eq!(p.velocity_to_amp, 0.7);
        assert_eq!(p.key_track, 0.0);
        assert_eq!(p.unison_voices, 1);
        assert_eq!(p.unison_detune, 0.0);
    }

    #[test]
    fn writes_are_clamped() {
        let params = SynthParams::new();
        params.set(ParamId::Cutoff, 5.0);
        assert_eq!(params.get(ParamId::Cutoff), 20.0);
        params.set(ParamId::Cutoff, 90_000.0);
        assert_eq!(params.get(ParamId::Cutoff), 20_000.0);
        params.set(ParamId::UnisonVoices, 9.0);
        assert_eq!(params.snapshot().unison_voices, 5);
        params.set(ParamId::GlideTime, -1.0);
        assert_eq!(params.get(ParamId::GlideTime), 0.0);
    }

    #[test]
    fn nan_falls_back_to_default() {
        let params = SynthParams::new();
        params.set(ParamId::Resonance, 0.9);
        params.set(ParamId::Resonance, f32::NAN);
        assert_eq!(params.get(ParamId::Resonance), 0.5);
    }

    #[test]
    fn discrete_params_round() {
        let params = SynthParams::new();
        params.set(ParamId::UnisonVoices, 3.4);
        assert_eq!(params.get(ParamId::UnisonVoices), 3.0);
        params.set(ParamId::SubOctave, 1.7);
        assert_eq!(params.snapshot().sub_octave, SubOctave::Two);
    }

    #[test]
    fn skewed_range_stretches_low_end() {
        let mid = CUTOFF_RANGE.from_normalized(0.5);
        assert!(mid > 1_500.0 && mid < 2_500.0, "midpoint was {}", mid);

        for &value in &[20.0, 440.0, 1_000.0, 12_000.0, 20_000.0] {
            let back = CUTOFF_RANGE.from_normalized(CUTOFF_RANGE.to_normalized(value));
            assert!((back - value).abs() < value * 1e-3, "{} came back as {}", value, back);
        }
    }

    #[test]
    fn apply_publishes_a_snapshot() {
        let params = SynthParams::new();
        let mut preset = params.snapshot();
        preset.cutoff = 3_000.0;
        preset.sub_octave = SubOctave::Two;
        preset.unison_voices = 4;
        preset.drive = 0.4;

        params.apply(&preset);
        assert_eq!(params.snapshot(), preset);

        params.reset_to_defaults();
        assert_eq!(params.snapshot(), VoiceParams::default());
    }

    #[test]
    fn reader_sees_latest_value_across_threads() {
        let params = Arc::new(SynthParams::new());
        let writer = Arc::clone(&params);

        thread::spawn(move || {
            for i in 0..=100 {
                writer.set(ParamId::Drive, i as f32 / 100.0);
            }
        })
        .join()
        .unwrap();

        assert_eq!(params.get(ParamId::Drive), 1.0);
    }
}
