// Purpose: the per-note voice pipeline and the pool that schedules it

pub mod message;
pub mod poly;
pub mod voice;

use crate::io::AudioBuffer;

pub use poly::PolySynth;
pub use voice::SynthVoice;

/// Centre position of the 14-bit pitch wheel.
pub const PITCH_WHEEL_CENTER: i32 = 8192;

/// What kind of sound a pool entry wants to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// The subtractive synth sound rendered by `SynthVoice`.
    Synth,
    /// A sound owned by some other engine sharing the pool.
    External,
}

/// The one sound this crate renders. Plays on every note and every channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynthSound;

impl SynthSound {
    pub fn kind(&self) -> SoundKind {
        SoundKind::Synth
    }

    pub fn applies_to_note(&self, _note: i32) -> bool {
        true
    }

    pub fn applies_to_channel(&self, _channel: i32) -> bool {
        true
    }
}

/// Lifecycle a voice pool drives.
pub trait Voice {
    /// Allocate working buffers. Must run before the first render.
    fn prepare_to_play(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize);

    fn can_play_sound(&self, sound: SoundKind) -> bool;

    /// Begin a note. `velocity` is 0..=1, `pitch_wheel` 0..=16383.
    fn start_note(&mut self, note: i32, velocity: f32, pitch_wheel: i32);

    /// End a note, releasing when `allow_tail_off`, otherwise silencing at once.
    fn stop_note(&mut self, velocity: f32, allow_tail_off: bool);

    /// Add `num_samples` into every channel of `output` from `start_sample` on.
    fn render_next_block(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize);

    fn is_active(&self) -> bool;

    fn pitch_wheel_moved(&mut self, _value: i32) {}

    fn controller_moved(&mut self, _controller: i32, _value: i32) {}
}
