//! Low Frequency Oscillator (LFO) for filter movement.

use std::f64::consts::TAU;

use super::oscillator::advance_phase;
use crate::sanitize;

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio frequencies. The same phase
accumulator math as the audio oscillators applies; the output drives a
parameter instead of the speaker.

Vocabulary
----------

  control-rate    Frequencies below human hearing: ~0.01 Hz to ~20 Hz.

  bipolar         Output swings positive AND negative: -1.0 to +1.0.
                  Cutoff moves above AND below its base value.

  depth           Not stored here. The modulation router scales the raw
                  output by its LFO amount, so at amount 0 the LFO keeps
                  running without any audible effect.


Typical Rates
-------------

    0.01 - 0.1 Hz   Very slow sweeps, evolving textures
    0.5 - 2 Hz      Classic filter wobble
    2 - 7 Hz        Fast "wah" movement
    > 15 Hz         Approaching audio rate (sidebands, growl)


Phase Handling
--------------

The voice's LFO is FREE-RUNNING: note_on does not reset its phase, so
successive notes catch the sweep at different points.

    value = sin(2π · phase)
    phase += rate / sample_rate      (wraps at 1.0)
*/

pub const MIN_RATE: f32 = 0.01;
pub const MAX_RATE: f32 = 20.0;
const DEFAULT_RATE: f32 = 1.0;

/// Free-running sine LFO.
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f64,
    rate: f32,
    sample_rate: f32,
}

impl Lfo {
    pub fn new(rate: f32) -> Self {
        Self {
            phase: 0.0,
            rate: sanitize(rate, MIN_RATE, MAX_RATE, DEFAULT_RATE),
            sample_rate: 44_100.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
    }

    /// Rate in Hz, clamped to 0.01..=20. NaN falls back to 1 Hz.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = sanitize(rate, MIN_RATE, MAX_RATE, DEFAULT_RATE);
    }

    /// Raw bipolar value for the current phase, then advance one sample.
    ///
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = (TAU * self.phase).sin() as f32;
        self.phase = advance_phase(self.phase, self.rate as f64 / self.sample_rate as f64);
        value
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(DEFAULT_RATE)
    }
}
