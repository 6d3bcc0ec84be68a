//! Audio device setup and the audio callback

use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use rtrb::RingBuffer;
use std::sync::Arc;
use tracing::{error, info, warn};

use thicc_dsp::{
    io::AudioBuffer,
    params::SynthParams,
    synth::{message::SynthMessage, PolySynth},
    MAX_BLOCK_SIZE,
};

use super::midi::connect_first_input;
use super::ui::UiApp;

/// Pending note events from each input (UI keyboard, MIDI port) to the audio thread.
const NOTE_QUEUE_SIZE: usize = 256;
/// Samples buffered for the oscilloscope and spectrum.
const SCOPE_QUEUE_SIZE: usize = 16_384;

/// Application builder
pub struct Thicc {
    params: Arc<SynthParams>,
}

impl Thicc {
    pub fn new() -> Self {
        Self {
            params: Arc::new(SynthParams::new()),
        }
    }

    /// Open the default output device, start the synth, and hand the terminal to the UI
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        if supported.sample_format() != SampleFormat::F32 {
            bail!(
                "output device wants {:?} samples; only f32 is supported",
                supported.sample_format()
            );
        }

        let sample_rate = supported.sample_rate().0 as f64;
        let channels = supported.channels() as usize;
        if channels == 0 {
            bail!("output device reports zero channels");
        }
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        info!(device = %device_name, sample_rate, channels, "opening output stream");

        let (note_tx, note_rx) = RingBuffer::<SynthMessage>::new(NOTE_QUEUE_SIZE);
        let (midi_tx, midi_rx) = RingBuffer::<SynthMessage>::new(NOTE_QUEUE_SIZE);
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_QUEUE_SIZE);

        // A missing or busy MIDI device is not fatal
        let midi_connection = connect_first_input(midi_tx).unwrap_or_else(|err| {
            warn!("MIDI input unavailable: {}", err);
            None
        });

        let mut synth = PolySynth::new((note_rx, midi_rx), Arc::clone(&self.params));
        synth.prepare_to_play(sample_rate, MAX_BLOCK_SIZE, channels);
        let mut block = AudioBuffer::new(channels, MAX_BLOCK_SIZE);

        let stream = device.build_output_stream(
            &supported.into(),
            move |data: &mut [f32], _| {
                for out in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                    let frames = out.len() / channels;

                    block.clear();
                    synth.render_block(&mut block, 0, frames);
                    block.write_interleaved(out);

                    // Scope is best effort: drop samples when the UI falls behind
                    for &sample in &block.channel(0)[..frames] {
                        if scope_tx.push(sample).is_err() {
                            break;
                        }
                    }
                }
            },
            |err| error!("audio stream error: {}", err),
            None,
        )?;

        stream.play().wrap_err("failed to start output stream")?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(scope_rx, note_tx, Arc::clone(&self.params), sample_rate, channels)
            .run(&mut terminal);
        ratatui::restore();

        drop(midi_connection);
        drop(stream);
        info!("output stream closed");
        result
    }
}

impl Default for Thicc {
    fn default() -> Self {
        Self::new()
    }
}
