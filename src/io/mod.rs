// Purpose - host-facing buffers and event formats

pub mod converter;
pub mod midi;

/// Owned multi-channel audio block, one `Vec<f32>` per channel.
///
/// Voices write into it additively; the caller clears it between blocks.
#[derive(Debug, Default, Clone)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    num_samples: usize,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_samples]; num_channels],
            num_samples,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.channels.iter_mut().map(|c| c.as_mut_slice())
    }

    /// Add `source` into every channel starting at `start_sample`.
    ///
    /// Samples that would land past the end of the buffer are dropped.
    pub fn add_to_all_channels(&mut self, start_sample: usize, source: &[f32]) {
        for channel in self.channels.iter_mut() {
            let Some(dest) = channel.get_mut(start_sample..) else {
                continue;
            };
            for (d, &s) in dest.iter_mut().zip(source) {
                *d += s;
            }
        }
    }

    pub fn clear(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.fill(0.0);
        }
    }

    /// Write channels interleaved into `out` (frames × channels), as audio devices expect.
    pub fn write_interleaved(&self, out: &mut [f32]) {
        let channels = self.num_channels();
        if channels == 0 {
            return;
        }
        for (frame_index, frame) in out.chunks_mut(channels).enumerate().take(self.num_samples) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = self.channels[ch][frame_index];
            }
        }
    }
}
