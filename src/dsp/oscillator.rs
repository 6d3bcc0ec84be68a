use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{sanitize, MAX_UNISON};

/*
Band-Limited Sawtooth, Unison and Sub
=====================================

Vocabulary
----------

  phase         Position within one cycle, always in [0, 1). Advanced by the
                phase increment every sample and wrapped back by subtracting 1.

  increment     frequency / sample_rate. How far the phase moves per sample.
                Also called `dt` in the correction polynomial below.

  discontinuity The instant the naive saw drops from +1 to -1. A hard step
                contains energy at every frequency, so frequencies above
                Nyquist fold back down as inharmonic aliasing.


The Naive Saw
-------------

    output = phase * 2 - 1

     1 ┤   ╱│   ╱│   ╱
       │  ╱ │  ╱ │  ╱
     0 ┤ ╱  │ ╱  │ ╱
       │╱   │╱   │╱
    -1 ┤    ╵    ╵

PolyBLEP
--------

Instead of oversampling the oscillator, we subtract a tiny polynomial
"residual" from the two samples adjacent to each wrap. The residual is the
difference between an ideal band-limited step and a hard step, approximated
by a 2nd order polynomial that only exists within one increment of the jump:

    t < dt         t/dt = x   →  residual = 2x - x² - 1
    t > 1 - dt     (t-1)/dt   →  residual = x² + 2x + 1
    otherwise                 →  0

Each unison voice runs at its own detuned frequency, so each one must use its
own increment when it evaluates the correction.


Unison Spread
-------------

N voices are spread evenly across ±50 cents at full detune:

    offset(i) = i / (N - 1) - 0.5        (0 when N = 1)
    cents(i)  = offset(i) × detune × 100
    ratio(i)  = 2^(cents / 1200)

    N = 5, detune = 1.0:
      -50   -25    0   +25   +50  cents

Outputs are averaged (sum / N). With detune at zero all voices share one
pitch and start in phase, so the stack collapses to exactly one saw.


Sub-Oscillator
--------------

A plain sine one or two octaves below the main pitch. A sine has no
discontinuities, so it needs no correction. It is added on top of the saw
mix without normalization; later stages (filter, drive) absorb the headroom.
*/

/// Detune amounts at or below this collapse the unison stack onto one pitch.
const DETUNE_THRESHOLD: f32 = 0.01;
/// Spread between the outermost unison voices at full detune, in cents.
const MAX_SPREAD_CENTS: f32 = 100.0;

/// PolyBLEP residual for a phase `t` in [0, 1) with increment `dt`.
///
/// Subtract the result from the naive saw value.
#[inline]
pub fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }

    if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}

/// Advance a phase accumulator and keep it inside [0, 1).
#[inline]
pub fn advance_phase(phase: f64, increment: f64) -> f64 {
    let mut next = phase + increment;
    if next >= 1.0 {
        next -= 1.0;
        // Increments of a full cycle or more (sub-Nyquist sample rates)
        if next >= 1.0 {
            next = next.fract();
        }
    }
    next
}

/// Detune in cents for unison voice `index` of `voices`.
pub fn unison_detune_cents(index: usize, voices: usize, detune: f32) -> f32 {
    if voices <= 1 || detune <= DETUNE_THRESHOLD {
        return 0.0;
    }
    let spread = (index as f32 / (voices - 1) as f32) - 0.5;
    spread * detune * MAX_SPREAD_CENTS
}

/// Stack of up to `MAX_UNISON` PolyBLEP sawtooth oscillators.
pub struct UnisonOscillator {
    phases: [f64; MAX_UNISON],
    ratios: [f64; MAX_UNISON],
    voices: usize,
    detune: f32,
}

impl UnisonOscillator {
    pub fn new() -> Self {
        Self {
            phases: [0.0; MAX_UNISON],
            ratios: [1.0; MAX_UNISON],
            voices: 1,
            detune: 0.0,
        }
    }

    /// Number of stacked voices, clamped to 1..=5.
    pub fn set_voices(&mut self, voices: usize) {
        let voices = voices.clamp(1, MAX_UNISON);
        if voices != self.voices {
            self.voices = voices;
            self.update_ratios();
        }
    }

    /// Detune amount, clamped to 0..=1. NaN means no detune.
    pub fn set_detune(&mut self, detune: f32) {
        let detune = sanitize(detune, 0.0, 1.0, 0.0);
        if detune != self.detune {
            self.detune = detune;
            self.update_ratios();
        }
    }

    fn update_ratios(&mut self) {
        for (index, ratio) in self.ratios.iter_mut().enumerate() {
            let cents = unison_detune_cents(index, self.voices, self.detune);
            *ratio = 2.0_f64.powf(cents as f64 / 1200.0);
        }
    }

    /// Produce one averaged sample. `increment` is the undetuned frequency / sample rate.
    #[inline]
    pub fn next_sample(&mut self, increment: f64) -> f32 {
        let mut sum = 0.0;

        for index in 0..self.voices {
            let dt = increment * self.ratios[index];
            let phase = self.phases[index];

            sum += phase * 2.0 - 1.0 - poly_blep(phase, dt);
            self.phases[index] = advance_phase(phase, dt);
        }

        if self.voices > 1 {
            sum /= self.voices as f64;
        }
        sum as f32
    }

    /// Restart every voice at phase zero.
    pub fn reset(&mut self) {
        self.phases = [0.0; MAX_UNISON];
    }

    pub fn voices(&self) -> usize {
        self.voices
    }

    pub fn detune(&self) -> f32 {
        self.detune
    }

    pub fn phases(&self) -> &[f64; MAX_UNISON] {
        &self.phases
    }
}

impl Default for UnisonOscillator {
    fn default() -> Self {
        Self::new()
    }
}

/// How far below the main pitch the sub sine sits.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubOctave {
    #[default]
    One,
    Two,
}

impl SubOctave {
    /// Map a selector value to an octave, clamping to 1..=2.
    pub fn from_selector(octaves: i32) -> Self {
        if octaves >= 2 {
            SubOctave::Two
        } else {
            SubOctave::One
        }
    }

    pub fn divisor(self) -> f64 {
        match self {
            SubOctave::One => 2.0,
            SubOctave::Two => 4.0,
        }
    }

    pub fn octaves(self) -> i32 {
        match self {
            SubOctave::One => 1,
            SubOctave::Two => 2,
        }
    }
}

/// Pure sine sub-oscillator.
#[derive(Debug, Default)]
pub struct SubOscillator {
    phase: f64,
}

impl SubOscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    #[inline]
    pub fn next_sample(&mut self, increment: f64) -> f32 {
        let out = (TAU * self.phase).sin() as f32;
        self.phase = advance_phase(self.phase, increment);
        out
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference single saw with no unison bookkeeping.
    fn reference_saw(increment: f64, samples: usize) -> Vec<f32> {
        let mut phase = 0.0;
        (0..samples)
            .map(|_| {
                let out = (phase * 2.0 - 1.0 - poly_blep(phase, increment)) as f32;
                phase = advance_phase(phase, increment);
                out
            })
            .collect()
    }

    #[test]
    fn phase_stays_in_unit_interval() {
        let cases = [
            (44_100.0, 20.0),
            (48_000.0, 440.0),
            (96_000.0, 19_000.0),
            (8_000.0, 7_999.0),
            (1_000.0, 2_500.0), // increment above one cycle
        ];

        for (sample_rate, freq) in cases {
            let increment = freq / sample_rate;
            let mut osc = UnisonOscillator::new();
            osc.set_voices(5);
            osc.set_detune(1.0);
            let mut sub = SubOscillator::new();

            for _ in 0..10_000 {
                osc.next_sample(increment);
                sub.next_sample(increment / 2.0);
                for &phase in osc.phases() {
                    assert!((0.0..1.0).contains(&phase), "phase {} escaped", phase);
                }
                assert!((0.0..1.0).contains(&sub.phase()));
            }
        }
    }

    #[test]
    fn single_voice_matches_plain_saw_for_any_detune() {
        let increment = 440.0 / 48_000.0;
        let expected = reference_saw(increment, 512);

        for detune in [0.0, 0.3, 1.0] {
            let mut osc = UnisonOscillator::new();
            osc.set_voices(1);
            osc.set_detune(detune);
            let rendered: Vec<f32> = (0..512).map(|_| osc.next_sample(increment)).collect();

            for (a, b) in rendered.iter().zip(&expected) {
                assert!((a - b).abs() < 1e-6, "detune {} diverged", detune);
            }
        }
    }

    #[test]
    fn zero_detune_stack_collapses_to_one_saw() {
        let increment = 220.0 / 44_100.0;
        let expected = reference_saw(increment, 256);

        let mut osc = UnisonOscillator::new();
        osc.set_voices(5);
        osc.set_detune(0.0);
        for &reference in &expected {
            let out = osc.next_sample(increment);
            assert!((out - reference).abs() < 1e-5, "stack cancelled or drifted");
        }
    }

    #[test]
    fn detune_spread_is_symmetric() {
        assert_eq!(unison_detune_cents(0, 1, 1.0), 0.0);
        assert!((unison_detune_cents(0, 5, 1.0) + 50.0).abs() < 1e-4);
        assert!(unison_detune_cents(2, 5, 1.0).abs() < 1e-4);
        assert!((unison_detune_cents(4, 5, 1.0) - 50.0).abs() < 1e-4);
        assert!((unison_detune_cents(1, 3, 0.5) - 0.0).abs() < 1e-4);
        assert_eq!(unison_detune_cents(4, 5, 0.005), 0.0);
    }

    #[test]
    fn voice_count_is_clamped() {
        let mut osc = UnisonOscillator::new();
        osc.set_voices(0);
        assert_eq!(osc.voices(), 1);
        osc.set_voices(12);
        assert_eq!(osc.voices(), MAX_UNISON);
    }

    #[test]
    fn poly_blep_is_zero_away_from_wrap() {
        let dt = 0.01;
        assert_eq!(poly_blep(0.5, dt), 0.0);
        // Both sides of the wrap meet at the midpoint of the step
        assert!((poly_blep(0.0, dt) + 1.0).abs() < 1e-12);
        assert!((poly_blep(0.999_999_999, dt) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn blep_softens_the_wrap() {
        let increment = 1_000.0 / 48_000.0;
        let saw = reference_saw(increment, 480);
        let naive_jump = 2.0 - 2.0 * increment as f32;

        let max_step = saw
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0f32, f32::max);
        assert!(
            max_step < naive_jump * 0.8,
            "largest step {} should be well below naive {}",
            max_step,
            naive_jump
        );
    }

    #[test]
    fn sub_octave_selector_clamps() {
        assert_eq!(SubOctave::from_selector(0), SubOctave::One);
        assert_eq!(SubOctave::from_selector(2), SubOctave::Two);
        assert_eq!(SubOctave::from_selector(7), SubOctave::Two);
        assert_eq!(SubOctave::Two.divisor(), 4.0);
    }

    #[test]
    fn sub_oscillator_is_a_sine() {
        let mut sub = SubOscillator::new();
        let increment = 0.25;
        let out: Vec<f32> = (0..4).map(|_| sub.next_sample(increment)).collect();
        assert!(out[0].abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
        assert!(out[2].abs() < 1e-6);
        assert!((out[3] + 1.0).abs() < 1e-6);
    }
}
