use std::sync::Arc;

use tracing::debug;

use crate::{
    io::{converter::velocity_to_unit, AudioBuffer},
    params::SynthParams,
    synth::{
        message::{MessageReceiver, SynthMessage},
        voice::SynthVoice,
        PITCH_WHEEL_CENTER,
    },
    NUM_VOICES,
};

/// Pool bookkeeping for one voice.
struct VoiceSlot {
    voice: SynthVoice,
    note: Option<u8>,
    started_at: u64,
}

/// Fixed pool of `SynthVoice`s fed by a message queue.
///
/// Voices are stored by concrete type so parameter updates reach them
/// directly. Allocation order: a free voice, else the oldest releasing
/// voice, else the oldest voice.
pub struct PolySynth<R: MessageReceiver> {
    slots: Vec<VoiceSlot>,
    rx: R,
    params: Arc<SynthParams>,
    pitch_wheel: i32,
    frame_counter: u64,
}

impl<R: MessageReceiver> PolySynth<R> {
    pub fn new(rx: R, params: Arc<SynthParams>) -> Self {
        Self::with_voices(NUM_VOICES, rx, params)
    }

    pub fn with_voices(max_voices: usize, rx: R, params: Arc<SynthParams>) -> Self {
        let snapshot = params.snapshot();
        let slots = (0..max_voices.max(1))
            .map(|_| VoiceSlot {
                voice: SynthVoice::with_params(&snapshot),
                note: None,
                started_at: 0,
            })
            .collect::<Vec<_>>();

        debug!(voices = slots.len(), "poly synth created");

        Self {
            slots,
            rx,
            params,
            pitch_wheel: PITCH_WHEEL_CENTER,
            frame_counter: 0,
        }
    }

    /// Prepare every voice. Not realtime-safe.
    pub fn prepare_to_play(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) {
        for slot in &mut self.slots {
            slot.voice.prepare_to_play(sample_rate, max_block_size, num_channels);
        }
    }

    /// Drain pending messages, then add every sounding voice into `output`.
    pub fn render_block(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        while let Some(msg) = self.rx.pop() {
            self.handle_message(msg);
        }

        let snapshot = self.params.snapshot();
        for slot in &mut self.slots {
            slot.voice.apply_params(&snapshot);
            if slot.voice.is_active() {
                slot.voice.render_next_block(output, start_sample, num_samples);
            }
            if !slot.voice.is_active() {
                slot.note = None;
            }
        }

        self.frame_counter += num_samples as u64;
    }

    pub fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity: 0 } => self.note_off(note),
            SynthMessage::NoteOn { note, velocity } => self.note_on(note, velocity),
            SynthMessage::NoteOff { note, .. } => self.note_off(note),
            SynthMessage::PitchBend { position } => {
                self.pitch_wheel = position as i32;
                for slot in &mut self.slots {
                    slot.voice.pitch_wheel_moved(self.pitch_wheel);
                }
            }
            SynthMessage::AllNotesOff => {
                for slot in &mut self.slots {
                    if slot.voice.is_active() {
                        slot.voice.stop_note(0.0, true);
                    }
                }
            }
            SynthMessage::Panic => {
                for slot in &mut self.slots {
                    slot.voice.stop_note(0.0, false);
                    slot.note = None;
                }
            }
        }
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let index = self.allocate_voice();
        let started_at = self.frame_counter;
        let pitch_wheel = self.pitch_wheel;
        let slot = &mut self.slots[index];

        if slot.voice.is_active() {
            slot.voice.stop_note(0.0, false);
        }
        slot.voice
            .start_note(note as i32, velocity_to_unit(velocity), pitch_wheel);
        slot.note = Some(note);
        slot.started_at = started_at;
    }

    fn note_off(&mut self, note: u8) {
        if let Some(slot) = self
            .slots
            .iter_mut()
            .filter(|s| s.note == Some(note) && s.voice.is_active() && !s.voice.is_releasing())
            .min_by_key(|s| s.started_at)
        {
            slot.voice.stop_note(0.0, true);
        }
    }

    fn allocate_voice(&self) -> usize {
        // First pass: a free voice
        if let Some(index) = self.slots.iter().position(|s| !s.voice.is_active()) {
            return index;
        }

        // Second pass: the oldest releasing voice
        let releasing = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.voice.is_releasing())
            .min_by_key(|(_, s)| s.started_at)
            .map(|(index, _)| index);
        if let Some(index) = releasing {
            return index;
        }

        // Last resort: steal the oldest note
        self.slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.started_at)
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    pub fn active_voice_count(&self) -> usize {
        self.slots.iter().filter(|s| s.voice.is_active()).count()
    }

    /// Notes currently held or releasing, one entry per voice.
    pub fn sounding_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots
            .iter()
            .filter(|s| s.voice.is_active())
            .filter_map(|s| s.note)
    }

    pub fn voices(&self) -> impl Iterator<Item = &SynthVoice> {
        self.slots.iter().map(|s| &s.voice)
    }

    pub fn params(&self) -> &Arc<SynthParams> {
        &self.params
    }
}
