//! Modulation routing for the filter cutoff and velocity gain.

use crate::sanitize;

/*
Modulation Routing
==================

Every sample, the voice turns four independent sources into one filter
cutoff. Each source has a fixed range in Hz, scaled by its amount knob:

    source          value range        full-scale swing
    ------          -----------        ----------------
    filter env      0 .. 1             +10 kHz
    LFO             -1 .. +1           ±5 kHz
    velocity        0 .. 1             ±3 kHz around velocity 0.5
    key tracking    MIDI note          +50 Hz per semitone above C4 (60)

    cutoff = base
           + env × env_amount × 10000
           + lfo × lfo_amount × 5000
           + (velocity − 0.5) × 2 × vel_amount × 3000
           + (note − 60) × 50 × key_amount

The sum is clamped to [20, 20000] Hz. The filter additionally caps the top
at just under Nyquist for low sample rates.

Worked example: base 1 kHz, env at 0.5 with amount 0.5, velocity 1.0 with
amount 0.5, everything else off:

    1000 + 0.5×0.5×10000 + 0.5×2×0.5×3000 = 1000 + 2500 + 1500 = 5000 Hz


Velocity to Amplitude
---------------------

    gain = (1 − amount) + velocity × amount

    amount 0.0 → gain is always 1 (velocity ignored)
    amount 1.0 → gain equals velocity
*/

pub const MIN_CUTOFF: f32 = 20.0;
pub const MAX_CUTOFF: f32 = 20_000.0;

const ENV_RANGE_HZ: f32 = 10_000.0;
const LFO_RANGE_HZ: f32 = 5_000.0;
const VELOCITY_RANGE_HZ: f32 = 3_000.0;
const KEY_TRACK_HZ_PER_SEMITONE: f32 = 50.0;
const KEY_TRACK_CENTER_NOTE: f32 = 60.0;
/// Key tracking amounts at or below this are treated as off.
const KEY_TRACK_THRESHOLD: f32 = 0.01;

/// Calculate the modulated parameter value: base + (modulator × depth).
#[inline]
pub fn apply_modulation(base_value: f32, modulator: f32, depth: f32) -> f32 {
    base_value + (modulator * depth)
}

/// How strongly each source moves the cutoff. All in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModAmounts {
    pub filter_env: f32,
    pub lfo: f32,
    pub velocity_to_filter: f32,
    pub velocity_to_amp: f32,
    pub key_track: f32,
}

impl ModAmounts {
    /// Every amount into 0..=1; NaN takes the default amount.
    pub fn clamped(self) -> Self {
        let fallback = Self::default();
        let unit = |v: f32, d: f32| sanitize(v, 0.0, 1.0, d);
        Self {
            filter_env: unit(self.filter_env, fallback.filter_env),
            lfo: unit(self.lfo, fallback.lfo),
            velocity_to_filter: unit(self.velocity_to_filter, fallback.velocity_to_filter),
            velocity_to_amp: unit(self.velocity_to_amp, fallback.velocity_to_amp),
            key_track: unit(self.key_track, fallback.key_track),
        }
    }
}

impl Default for ModAmounts {
    fn default() -> Self {
        Self {
            filter_env: 0.0,
            lfo: 0.0,
            velocity_to_filter: 0.5,
            velocity_to_amp: 0.7,
            key_track: 0.0,
        }
    }
}

/// Instantaneous source values for one sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModSources {
    /// Filter envelope output after the exponential curve.
    pub filter_env: f32,
    /// Raw bipolar LFO value.
    pub lfo: f32,
    pub velocity: f32,
    pub note: i32,
}

/// Cutoff offset from velocity, ±3 kHz at full sensitivity.
#[inline]
pub fn velocity_filter_mod(velocity: f32, amount: f32) -> f32 {
    (velocity - 0.5) * 2.0 * amount * VELOCITY_RANGE_HZ
}

/// Cutoff offset from key tracking, 50 Hz per semitone from middle C at full tracking.
#[inline]
pub fn key_track_mod(note: i32, amount: f32) -> f32 {
    if amount <= KEY_TRACK_THRESHOLD {
        return 0.0;
    }
    (note as f32 - KEY_TRACK_CENTER_NOTE) * KEY_TRACK_HZ_PER_SEMITONE * amount
}

/// Combine every source into a cutoff in [20, 20000] Hz.
#[inline]
pub fn modulated_cutoff(base_cutoff: f32, sources: &ModSources, amounts: &ModAmounts) -> f32 {
    let mut cutoff = apply_modulation(base_cutoff, sources.filter_env, amounts.filter_env * ENV_RANGE_HZ);
    cutoff = apply_modulation(cutoff, sources.lfo, amounts.lfo * LFO_RANGE_HZ);
    cutoff += velocity_filter_mod(sources.velocity, amounts.velocity_to_filter);
    cutoff += key_track_mod(sources.note, amounts.key_track);

    // NaN never reaches the filter: clamp alone would pass it through
    if cutoff.is_nan() {
        return MIN_CUTOFF;
    }
    cutoff.clamp(MIN_CUTOFF, MAX_CUTOFF)
}

/// Pre-envelope gain from note velocity.
#[inline]
pub fn velocity_gain(velocity: f32, amount: f32) -> f32 {
    (1.0 - amount) + velocity * amount
}
