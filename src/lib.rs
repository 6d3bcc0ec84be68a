pub mod dsp;
pub mod io;
pub mod params; // Lock-free parameter store shared with the UI thread
pub mod synth; // Voice pipeline and polyphony

pub const MAX_BLOCK_SIZE: usize = 2048;
/// Upper bound on stacked unison oscillators per voice.
pub const MAX_UNISON: usize = 5;
/// Voices owned by `PolySynth`.
pub const NUM_VOICES: usize = 8;

/// Clamp into `min..=max`. NaN becomes `fallback`, which `clamp` would pass through.
#[inline]
pub fn sanitize(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
