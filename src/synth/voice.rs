use tracing::debug;

use crate::dsp::distortion::DriveStage;
use crate::dsp::envelope::{Envelope, EnvelopeParams, EnvelopeState};
use crate::dsp::filter::LadderFilter;
use crate::dsp::glide::{midi_note_to_freq, Glide};
use crate::dsp::lfo::Lfo;
use crate::dsp::modulate::{modulated_cutoff, velocity_gain, ModAmounts, ModSources, MAX_CUTOFF, MIN_CUTOFF};
use crate::dsp::oscillator::{SubOctave, SubOscillator, UnisonOscillator};
use crate::dsp::smooth::SmoothedValue;
use crate::io::AudioBuffer;
use crate::params::VoiceParams;
use crate::synth::{SoundKind, Voice};
use crate::sanitize;

/*
Synth Voice
===========

One note's worth of sound. The pool owns a fixed set of these and reuses
them; a voice is never dropped while the synth runs, only switched between
"playing a note" and "free".

Signal Flow
-----------

Per sample:

    glide ──→ freq ──┬──→ [unison saw ×N] ──┐
                     └──→ [sub sine]  × mix ─┴─(+)─→ × vel gain ─→ × amp env ─→ scratch[i]

    lfo ─────────┐
    filter env ──┤
    velocity ────┼──→ modulation router ──→ cutoffs[i]
    note ────────┤
    smoothed base cutoff ─┘

Per block, after the sample loop:

    scratch ──→ [ladder filter, cutoffs[i] per sample] ──→ [2x tanh drive] ──(+)──→ every output channel

The voice renders into its own mono scratch buffer and only ADDS the result
into the caller's buffer, so the pool can sum any number of voices into one
mix without clearing in between, and one voice's filter never sees another
voice's signal.


Lifecycle
---------

    prepare_to_play   allocate scratch, cutoffs, oversampling buffers
          │
    start_note ──→ render_next_block … ──→ stop_note(tail off) ──→ render … ──→ amp env Idle
          ↑                                    │                                  │
          │                         stop_note(hard): envelopes reset              │
          └────────────────────────── voice is free ←─────────────────────────────┘

Nothing on the render path allocates, locks or logs. Blocks longer than the
prepared size are rendered in prepared-size chunks.


Parameters
----------

Parameters arrive by value (`apply_params`, once per block from the pool,
or the individual setters). Every setter clamps. Cutoff and resonance go
through ~10 ms smoothers so knob moves never step the filter.
*/

/// Ramp time for the base cutoff and resonance smoothers.
const FILTER_SMOOTHING_SECONDS: f64 = 0.01;
const DEFAULT_CUTOFF: f32 = 1_000.0;
const DEFAULT_RESONANCE: f32 = 0.5;

pub struct SynthVoice {
    sample_rate: f64,
    num_channels: usize,

    // Note identity
    current_note: Option<i32>,
    velocity: f32,

    // Sources
    glide: Glide,
    unison: UnisonOscillator,
    sub: SubOscillator,
    sub_mix: f32,
    sub_octave: SubOctave,
    lfo: Lfo,
    amp_env: Envelope,
    filter_env: Envelope,
    mod_amounts: ModAmounts,

    // Filter + drive
    cutoff: SmoothedValue,
    resonance: SmoothedValue,
    filter: LadderFilter,
    drive: DriveStage,

    // Preallocated per-block work buffers
    scratch: Vec<f32>,
    cutoffs: Vec<f32>,
}

impl SynthVoice {
    pub fn new() -> Self {
        Self {
            sample_rate: 44_100.0,
            num_channels: 0,

            current_note: None,
            velocity: 0.0,

            glide: Glide::new(),
            unison: UnisonOscillator::new(),
            sub: SubOscillator::new(),
            sub_mix: 0.0,
            sub_octave: SubOctave::One,
            lfo: Lfo::default(),
            amp_env: Envelope::with_params(EnvelopeParams::new(0.01, 0.1, 0.8, 0.1)),
            filter_env: Envelope::with_params(EnvelopeParams::new(0.01, 0.2, 0.3, 0.2)),
            mod_amounts: ModAmounts::default(),

            cutoff: SmoothedValue::new(DEFAULT_CUTOFF as f64),
            resonance: SmoothedValue::new(DEFAULT_RESONANCE as f64),
            filter: LadderFilter::new(DEFAULT_CUTOFF, DEFAULT_RESONANCE),
            drive: DriveStage::new(),

            scratch: Vec::new(),
            cutoffs: Vec::new(),
        }
    }

    /// Voice configured from a parameter snapshot.
    pub fn with_params(params: &VoiceParams) -> Self {
        let mut voice = Self::new();
        voice.apply_params(params);
        voice
    }

    /// Allocate buffers and adopt a sample rate. Not realtime-safe.
    pub fn prepare_to_play(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) {
        self.sample_rate = sample_rate.max(1.0);
        self.num_channels = num_channels;
        let max_block_size = max_block_size.max(1);

        let sr = self.sample_rate as f32;
        self.amp_env.set_sample_rate(sr);
        self.filter_env.set_sample_rate(sr);
        self.lfo.set_sample_rate(sr);
        self.glide.prepare(self.sample_rate);
        self.filter.prepare(sr);

        self.cutoff.reset(self.sample_rate, FILTER_SMOOTHING_SECONDS);
        self.resonance.reset(self.sample_rate, FILTER_SMOOTHING_SECONDS);
        self.cutoff.set_current_and_target(self.cutoff.target());
        self.resonance.set_current_and_target(self.resonance.target());
        self.filter.set_cutoff(self.cutoff.current() as f32);
        self.filter.set_resonance(self.resonance.current() as f32);

        self.scratch = vec![0.0; max_block_size];
        self.cutoffs = vec![MIN_CUTOFF; max_block_size];
        self.drive.prepare(max_block_size);

        debug!(
            sample_rate = self.sample_rate,
            max_block_size, num_channels, "voice prepared"
        );
    }

    pub fn can_play_sound(&self, sound: SoundKind) -> bool {
        sound == SoundKind::Synth
    }

    /// Begin `note`. Oscillator phases restart; envelopes attack from their current level.
    pub fn start_note(&mut self, note: i32, velocity: f32, _pitch_wheel: i32) {
        self.current_note = Some(note);
        self.velocity = sanitize(velocity, 0.0, 1.0, 0.0);

        self.glide.set_target(midi_note_to_freq(note));
        self.unison.reset();
        self.sub.reset();

        self.amp_env.note_on();
        self.filter_env.note_on();
    }

    pub fn stop_note(&mut self, _velocity: f32, allow_tail_off: bool) {
        if allow_tail_off {
            self.amp_env.note_off();
            self.filter_env.note_off();
        } else {
            self.amp_env.reset();
            self.filter_env.reset();
            self.clear_current_note();
        }
    }

    /// Add `num_samples` of this voice into every channel of `output`, starting at `start_sample`.
    pub fn render_next_block(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        if !self.amp_env.is_active() {
            self.clear_current_note();
            return;
        }

        // Unprepared voices have no buffers to render into
        let chunk_len = self.scratch.len();
        if chunk_len == 0 {
            return;
        }

        let end = (start_sample + num_samples).min(output.num_samples());
        let mut position = start_sample;
        while position < end {
            let len = (end - position).min(chunk_len);
            self.render_chunk(len);
            output.add_to_all_channels(position, &self.scratch[..len]);
            position += len;
        }

        if !self.amp_env.is_active() {
            self.clear_current_note();
        }
    }

    /// Fill `scratch[..len]` with filtered, driven voice output.
    fn render_chunk(&mut self, len: usize) {
        let gain = velocity_gain(self.velocity, self.mod_amounts.velocity_to_amp);
        let note = self.current_note.unwrap_or(60);
        let sub_divisor = self.sub_octave.divisor();
        let sample_rate = self.sample_rate;

        let scratch = &mut self.scratch[..len];
        let cutoffs = &mut self.cutoffs[..len];

        for (out, cutoff) in scratch.iter_mut().zip(cutoffs.iter_mut()) {
            let increment = self.glide.next_frequency() / sample_rate;

            let sources = ModSources {
                filter_env: self.filter_env.next_shaped(),
                lfo: self.lfo.next_sample(),
                velocity: self.velocity,
                note,
            };
            let amp = self.amp_env.next_shaped();

            let base_cutoff = self.cutoff.next_value() as f32;
            self.resonance.next_value();
            *cutoff = modulated_cutoff(base_cutoff, &sources, &self.mod_amounts);

            let saw = self.unison.next_sample(increment);
            let sub = self.sub.next_sample(increment / sub_divisor);
            *out = (saw + sub * self.sub_mix) * gain * amp;
        }

        let resonance = self.resonance.current() as f32;
        if resonance != self.filter.resonance() {
            self.filter.set_resonance(resonance);
        }
        self.filter.render_modulated(&mut self.scratch[..len], &self.cutoffs[..len]);
        self.drive.render(&mut self.scratch[..len]);
    }

    fn clear_current_note(&mut self) {
        self.current_note = None;
    }

    /// Amp envelope still producing sound.
    pub fn is_active(&self) -> bool {
        self.amp_env.is_active()
    }

    /// In release: gate is low but the tail is still audible.
    pub fn is_releasing(&self) -> bool {
        self.amp_env.state() == EnvelopeState::Release
    }

    pub fn current_note(&self) -> Option<i32> {
        self.current_note
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn pitch_wheel_moved(&mut self, _value: i32) {}

    pub fn controller_moved(&mut self, _controller: i32, _value: i32) {}

    // Parameter setters

    pub fn apply_params(&mut self, params: &VoiceParams) {
        self.set_filter_cutoff(params.cutoff);
        self.set_filter_resonance(params.resonance);
        self.set_amp_envelope(params.amp_env);
        self.set_filter_envelope(params.filter_env);
        self.set_filter_env_amount(params.filter_env_amount);
        self.set_sub_mix(params.sub_mix);
        self.set_sub_octave(params.sub_octave);
        self.set_lfo(params.lfo_rate, params.lfo_amount);
        self.set_drive(params.drive);
        self.set_glide_time(params.glide_time);
        self.set_velocity_sensitivity(params.velocity_to_filter, params.velocity_to_amp);
        self.set_key_tracking(params.key_track);
        self.set_unison(params.unison_voices, params.unison_detune);
    }

    /// Base cutoff in Hz; the filter glides to it over ~10 ms.
    pub fn set_filter_cutoff(&mut self, cutoff_hz: f32) {
        let cutoff = sanitize(cutoff_hz, MIN_CUTOFF, MAX_CUTOFF, DEFAULT_CUTOFF);
        self.cutoff.set_target(cutoff as f64);
    }

    pub fn set_filter_resonance(&mut self, resonance: f32) {
        let resonance = sanitize(resonance, 0.0, 1.0, DEFAULT_RESONANCE);
        self.resonance.set_target(resonance as f64);
    }

    pub fn set_amp_envelope(&mut self, params: EnvelopeParams) {
        self.amp_env.set_params(params);
    }

    pub fn set_filter_envelope(&mut self, params: EnvelopeParams) {
        self.filter_env.set_params(params);
    }

    pub fn set_filter_env_amount(&mut self, amount: f32) {
        self.mod_amounts.filter_env = amount;
        self.mod_amounts = self.mod_amounts.clamped();
    }

    pub fn set_sub_mix(&mut self, mix: f32) {
        self.sub_mix = sanitize(mix, 0.0, 1.0, 0.0);
    }

    pub fn set_sub_octave(&mut self, octave: SubOctave) {
        self.sub_octave = octave;
    }

    pub fn set_lfo(&mut self, rate: f32, amount: f32) {
        self.lfo.set_rate(rate);
        self.mod_amounts.lfo = amount;
        self.mod_amounts = self.mod_amounts.clamped();
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.drive.set_drive(drive);
    }

    pub fn set_glide_time(&mut self, seconds: f32) {
        self.glide.set_glide_time(seconds);
    }

    pub fn set_velocity_sensitivity(&mut self, to_filter: f32, to_amp: f32) {
        self.mod_amounts.velocity_to_filter = to_filter;
        self.mod_amounts.velocity_to_amp = to_amp;
        self.mod_amounts = self.mod_amounts.clamped();
    }

    pub fn set_key_tracking(&mut self, amount: f32) {
        self.mod_amounts.key_track = amount;
        self.mod_amounts = self.mod_amounts.clamped();
    }

    pub fn set_unison(&mut self, voices: usize, detune: f32) {
        self.unison.set_voices(voices);
        self.unison.set_detune(detune);
    }

    // Inspection, for the front panel and tests

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn current_frequency(&self) -> f64 {
        self.glide.current()
    }

    pub fn amp_envelope_state(&self) -> EnvelopeState {
        self.amp_env.state()
    }

    pub fn amp_level(&self) -> f32 {
        self.amp_env.level()
    }

    pub fn filter_cutoff(&self) -> f32 {
        self.filter.cutoff()
    }

    pub fn unison(&self) -> &UnisonOscillator {
        &self.unison
    }

    pub fn mod_amounts(&self) -> ModAmounts {
        self.mod_amounts
    }
}

impl Default for SynthVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for SynthVoice {
    fn prepare_to_play(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) {
        SynthVoice::prepare_to_play(self, sample_rate, max_block_size, num_channels);
    }

    fn can_play_sound(&self, sound: SoundKind) -> bool {
        SynthVoice::can_play_sound(self, sound)
    }

    fn start_note(&mut self, note: i32, velocity: f32, pitch_wheel: i32) {
        SynthVoice::start_note(self, note, velocity, pitch_wheel);
    }

    fn stop_note(&mut self, velocity: f32, allow_tail_off: bool) {
        SynthVoice::stop_note(self, velocity, allow_tail_off);
    }

    fn render_next_block(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        SynthVoice::render_next_block(self, output, start_sample, num_samples);
    }

    fn is_active(&self) -> bool {
        SynthVoice::is_active(self)
    }

    fn pitch_wheel_moved(&mut self, value: i32) {
        SynthVoice::pitch_wheel_moved(self, value);
    }

    fn controller_moved(&mut self, controller: i32, value: i32) {
        SynthVoice::controller_moved(self, controller, value);
    }
}
