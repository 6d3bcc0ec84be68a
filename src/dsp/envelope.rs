#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sanitize;

/// Shortest attack, decay or release in seconds.
pub const MIN_ENV_TIME: f32 = 0.001;
/// Longest attack, decay or release in seconds.
pub const MAX_ENV_TIME: f32 = 5.0;

/*
Linear ADSR
===========

One generator per voice shapes amplitude, a second one sweeps the filter
cutoff. Both run the same four-segment ramp:

    1.0 ┐    /\
        │   /  \__________
      S │  /              \
        │ /                \
    0.0 └/──────────────────\──→ t
         A   D      S       R

  rate     Per-sample step of the current segment, derived from the segment
           time and the sample rate. Attack climbs 1 / (A · sr) per sample,
           decay falls (1 - S) / (D · sr).

  release  Computed once at note_off from the level it starts at, so every
           release takes R seconds regardless of where it began.


Retriggering
------------

note_on keeps the current level and climbs from there. A note that lands
during a release resumes the attack without dropping to zero:

    1.0 ┐  /\__      /\__
        │ /    \    /
        │/      \__/   <- attack picks up here
    0.0 └──────────────────→

Because the attack slope is fixed, a retriggered attack arrives at 1.0 early.


Amplitude curve
---------------

`shaped_level()` squares the linear level. The state machine itself never
sees the squared value.


Transitions
-----------

    Idle ──note_on──> Attack ──1.0──> Decay ──S──> Sustain
      ^                 ^                │            │
      │                 └────note_on─────┤            │
      └──── 0.0 ──── Release <──note_off─┴────────────┘

reset() drops straight to Idle at zero.
*/

/// Segment the envelope is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Stage timing in seconds plus the sustain level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeParams {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Times into `MIN_ENV_TIME..=MAX_ENV_TIME`, sustain into [0, 1].
    /// NaN fields take the default's value.
    pub fn clamped(self) -> Self {
        let fallback = Self::default();
        let time = |t: f32, d: f32| sanitize(t, MIN_ENV_TIME, MAX_ENV_TIME, d);
        Self {
            attack: time(self.attack, fallback.attack),
            decay: time(self.decay, fallback.decay),
            sustain: sanitize(self.sustain, 0.0, 1.0, fallback.sustain),
            release: time(self.release, fallback.release),
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::new(0.01, 0.1, 0.8, 0.1)
    }
}

/// Square a linear level for a perceptually exponential response.
#[inline]
pub fn exponential_curve(level: f32) -> f32 {
    level * level
}

pub struct Envelope {
    params: EnvelopeParams,
    sample_rate: f32,
    state: EnvelopeState,
    level: f32,
    /// Fixed at note_off: starting level / release samples
    release_rate: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Self::with_params(EnvelopeParams::default())
    }

    pub fn with_params(params: EnvelopeParams) -> Self {
        Self {
            params: params.clamped(),
            sample_rate: 44_100.0,
            state: EnvelopeState::Idle,
            level: 0.0,
            release_rate: 0.0,
        }
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self::with_params(EnvelopeParams::new(attack, decay, sustain, release))
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
    }

    /// Takes effect on the next sample; a running release keeps its rate.
    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params.clamped();
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    /// Gate high: attack from wherever the level currently is.
    pub fn note_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    pub fn note_off(&mut self) {
        if self.state == EnvelopeState::Idle {
            return;
        }
        let release_samples = (self.params.release * self.sample_rate).max(1.0);
        self.release_rate = self.level / release_samples;
        self.state = EnvelopeState::Release;
    }

    /// Advance the envelope by one sample and return the linear level.
    pub fn next_sample(&mut self) -> f32 {
        let sustain = self.params.sustain;

        match self.state {
            EnvelopeState::Idle => self.level = 0.0,
            EnvelopeState::Attack => {
                self.level += 1.0 / (self.params.attack * self.sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                self.level -= (1.0 - sustain) / (self.params.decay * self.sample_rate);
                if self.level <= sustain {
                    self.level = sustain;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => self.level = sustain,
            EnvelopeState::Release => {
                self.level -= self.release_rate;
                if self.level <= 0.0 || self.release_rate <= 0.0 {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Advance one sample and return the squared level.
    #[inline]
    pub fn next_shaped(&mut self) -> f32 {
        exponential_curve(self.next_sample())
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        buffer.iter_mut().for_each(|out| *out = self.next_sample());
    }

    /// False only once the envelope sits in Idle at zero.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle || self.level != 0.0
    }

    /// Hard stop.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
        self.release_rate = 0.0;
    }

    /// Current linear level (0.0 to 1.0).
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Current level after the exponential curve.
    pub fn shaped_level(&self) -> f32 {
        exponential_curve(self.level)
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}
