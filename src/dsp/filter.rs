use std::f32::consts::PI;

use super::modulate::{MAX_CUTOFF, MIN_CUTOFF};
use crate::sanitize;

/*
Ladder Filter
=============

The voice's tone control: a 4-pole (24 dB/octave) resonant low-pass modeled
on the classic transistor ladder. A sawtooth is harmonically rich; sweeping
this filter down removes the upper harmonics, which is the whole idea of
"subtractive" synthesis.

Topology
--------

Four identical one-pole low-pass stages in series, with the output fed back
(inverted) to the input:

            ┌──────────────── k ←─────────────────┐
            ↓                                      │
    in ──→ (−) → tanh → [LP1] → [LP2] → [LP3] → [LP4] ──→ out

Each stage contributes 6 dB/octave, so four give 24 dB/octave. At the cutoff
each stage shifts phase by 45°, the four together by 180°, and the inverted
feedback turns into positive feedback: that is the resonant peak. The tanh
on the input keeps the loop bounded even when the resonance would otherwise
self-oscillate.

One-Pole Stage (TPT)
--------------------

Each stage uses the topology-preserving transform form, which keeps the
cutoff accurate right up to Nyquist:

    g = tan(π · fc / fs)        frequency pre-warping
    G = g / (1 + g)

    v = (x − s) · G
    y = v + s
    s = y + v                   integrator state for the next sample

Resonance
---------

User resonance 0..1 maps to feedback k = 4 · 0.95 · resonance. The 0.95
keeps the top of the knob just below self-oscillation. Feedback also pulls
down the passband level (the DC gain of an uncompensated ladder is
1 / (1 + k)), so half the input is added back into the feedback path:

    feedback = k · (y_prev − 0.5 · x)

which raises the DC gain to (1 + 0.5k) / (1 + k).

Cutoff Range
------------

    20 Hz  ..  min(20 kHz, 0.49 · fs)

The tan() pre-warp diverges at fs/2, so the top is held just below it.
*/

const MAX_FEEDBACK: f32 = 4.0 * 0.95;
const PASSBAND_COMPENSATION: f32 = 0.5;
/// States smaller than this are flushed to zero to avoid denormals.
const DENORMAL_FLOOR: f32 = 1e-20;

pub struct LadderFilter {
    stages: [f32; 4], // Integrator memory per stage
    last_output: f32,

    cutoff_hz: f32,
    resonance: f32,
    sample_rate: f32,

    big_g: f32, // g / (1 + g)
    k: f32,     // feedback amount
}

impl LadderFilter {
    pub fn new(cutoff_hz: f32, resonance: f32) -> Self {
        let mut filter = Self {
            stages: [0.0; 4],
            last_output: 0.0,
            cutoff_hz: 1_000.0,
            resonance: 0.0,
            sample_rate: 44_100.0,
            big_g: 0.0,
            k: 0.0,
        };
        filter.set_cutoff(cutoff_hz);
        filter.set_resonance(resonance);
        filter
    }

    /// Adopt a new sample rate and clear the filter memory.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.set_cutoff(self.cutoff_hz);
        self.reset();
    }

    /// Highest cutoff this sample rate allows.
    pub fn max_cutoff(&self) -> f32 {
        MAX_CUTOFF.min(self.sample_rate * 0.49)
    }

    /// NaN keeps the previous cutoff.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let cutoff = sanitize(
            cutoff_hz,
            MIN_CUTOFF,
            self.max_cutoff().max(MIN_CUTOFF),
            self.cutoff_hz,
        );
        self.cutoff_hz = cutoff;

        let g = (PI * cutoff / self.sample_rate).tan();
        self.big_g = g / (1.0 + g);
    }

    /// Resonance 0..=1, mapped to a stable feedback coefficient.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = sanitize(resonance, 0.0, 1.0, self.resonance);
        self.k = self.resonance * MAX_FEEDBACK;
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let feedback = self.k * (self.last_output - PASSBAND_COMPENSATION * input);
        let mut x = (input - feedback).tanh();

        for stage in self.stages.iter_mut() {
            let v = (x - *stage) * self.big_g;
            let y = v + *stage;
            *stage = y + v;
            if stage.abs() < DENORMAL_FLOOR {
                *stage = 0.0;
            }
            x = y;
        }

        self.last_output = x;
        x
    }

    /// Filter a block in place at the current cutoff.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Filter a block in place, taking a new cutoff for every sample.
    pub fn render_modulated(&mut self, buffer: &mut [f32], cutoffs: &[f32]) {
        for (sample, &cutoff) in buffer.iter_mut().zip(cutoffs) {
            if cutoff != self.cutoff_hz {
                self.set_cutoff(cutoff);
            }
            *sample = self.process_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.stages = [0.0; 4];
        self.last_output = 0.0;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }
}
