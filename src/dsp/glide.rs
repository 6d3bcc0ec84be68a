//! Portamento: smooth pitch movement between notes.

use super::smooth::SmoothedValue;
use crate::sanitize;

/*
Glide
=====

With glide off, a new note jumps straight to its pitch. With glide on, the
oscillator frequency slides from wherever it was toward the new note:

    freq
     ▲         ___________  target (new note)
     │       ╱
     │     ╱
     │___╱                  previous note
     └──────────────────→ time
         |← glide_time →|

The slide is exponential in Hz (one-pole smoothing, see `smooth.rs`), so it
moves quickly at first and settles gently. The smoothed frequency is read
every sample and drives both the saw stack and the sub-oscillator, keeping
the sub locked an octave (or two) below throughout the slide.

Glide times below 1 ms count as "off".
*/

pub const MAX_GLIDE_TIME: f32 = 2.0;
const GLIDE_OFF_THRESHOLD: f32 = 0.001;

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: i32) -> f64 {
    440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
}

pub struct Glide {
    frequency: SmoothedValue,
    glide_time: f32,
    sample_rate: f64,
}

impl Glide {
    pub fn new() -> Self {
        Self {
            frequency: SmoothedValue::new(440.0),
            glide_time: 0.0,
            sample_rate: 44_100.0,
        }
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate.max(1.0);
        self.frequency.reset(self.sample_rate, self.glide_time as f64);
        self.frequency.set_current_and_target(440.0);
    }

    /// Glide time in seconds, clamped to 0..=2. NaN turns glide off.
    pub fn set_glide_time(&mut self, seconds: f32) {
        let seconds = sanitize(seconds, 0.0, MAX_GLIDE_TIME, 0.0);
        if seconds != self.glide_time {
            self.glide_time = seconds;
            self.frequency.reset(self.sample_rate, seconds as f64);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.glide_time >= GLIDE_OFF_THRESHOLD
    }

    /// Aim at a new note; jumps immediately when glide is off.
    pub fn set_target(&mut self, frequency: f64) {
        if self.is_enabled() {
            self.frequency.set_target(frequency);
        } else {
            self.frequency.set_current_and_target(frequency);
        }
    }

    /// Advance one sample and return the current frequency in Hz.
    #[inline]
    pub fn next_frequency(&mut self) -> f64 {
        self.frequency.next_value()
    }

    pub fn current(&self) -> f64 {
        self.frequency.current()
    }

    pub fn target(&self) -> f64 {
        self.frequency.target()
    }

    pub fn is_gliding(&self) -> bool {
        self.frequency.is_smoothing()
    }

    pub fn glide_time(&self) -> f32 {
        self.glide_time
    }
}

impl Default for Glide {
    fn default() -> Self {
        Self::new()
    }
}
