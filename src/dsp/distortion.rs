//! Drive / Saturation
//!
//! Drive pushes the filtered voice into a tanh curve, rounding off peaks and
//! adding odd harmonics. The "drive" parameter (0..1) sets how hard the
//! signal is pushed:
//!
//!   output = tanh(input · (1 + drive · 9))
//!
//! # Why tanh
//!
//! tanh is smooth everywhere and saturates at ±1, so no amount of drive can
//! make the output leave that range. Small signals pass almost unchanged
//! (tanh(x) ≈ x near zero), loud ones are compressed toward the rails.
//!
//! # Aliasing
//!
//! The harmonics tanh creates extend far above Nyquist. The stage therefore
//! runs the curve at twice the sample rate (see `oversample.rs`) and filters
//! the extra octave away before returning to the original rate. The
//! decimation filter rings on squared-off waveforms, so the result is hard
//! limited to ±1.2.
//!
//! # Drive Values
//!
//!   0.00       = Bypassed (no oversampling, signal untouched)
//!   0.1 - 0.3  = Warm saturation
//!   0.5 - 1.0  = Obvious, gritty distortion (gain 5.5x to 10x)

use super::oversample::HalfBandOversampler;
use crate::sanitize;

/// Hard limit after decimation. The half-band filter rings past ±1 on
/// signals tanh has squared off.
pub const OUTPUT_CEILING: f32 = 1.2;

/// Drive amounts at or below this bypass the stage entirely.
pub const DRIVE_THRESHOLD: f32 = 0.01;
const MAX_EXTRA_GAIN: f32 = 9.0;

/// Pre-saturation gain for a drive amount in 0..=1.
#[inline]
pub fn drive_gain(drive: f32) -> f32 {
    1.0 + sanitize(drive, 0.0, 1.0, 0.0) * MAX_EXTRA_GAIN
}

/// tanh saturation with a gain applied first.
#[inline]
pub fn saturate(sample: f32, gain: f32) -> f32 {
    (sample * gain).tanh()
}

/// Apply saturation to an entire buffer in place, without oversampling.
pub fn saturate_buffer(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample = saturate(*sample, gain);
    }
}

/// Oversampled tanh drive for one mono voice.
pub struct DriveStage {
    oversampler: HalfBandOversampler,
    drive: f32,
}

impl DriveStage {
    pub fn new() -> Self {
        Self {
            oversampler: HalfBandOversampler::new(),
            drive: 0.0,
        }
    }

    /// Allocate the oversampling buffer for blocks up to `max_block_size`.
    pub fn prepare(&mut self, max_block_size: usize) {
        self.oversampler.prepare(max_block_size);
    }

    /// Drive 0..=1. NaN bypasses the stage.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = sanitize(drive, 0.0, 1.0, 0.0);
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn is_bypassed(&self) -> bool {
        self.drive <= DRIVE_THRESHOLD
    }

    /// Saturate `buffer` in place. Leaves it untouched while bypassed.
    pub fn render(&mut self, buffer: &mut [f32]) {
        if self.is_bypassed() {
            return;
        }

        let gain = drive_gain(self.drive);
        self.oversampler
            .process(buffer, |oversampled| saturate_buffer(oversampled, gain));

        for sample in buffer.iter_mut() {
            *sample = sample.clamp(-OUTPUT_CEILING, OUTPUT_CEILING);
        }
    }

    pub fn reset(&mut self) {
        self.oversampler.reset();
    }
}

impl Default for DriveStage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn saw(len: usize, period: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 2.0 * (i % period) as f32 / period as f32 - 1.0)
            .collect()
    }

    #[test]
    fn test_drive_gain_range() {
        assert_eq!(drive_gain(0.0), 1.0);
        assert_eq!(drive_gain(1.0), 10.0);
        assert_eq!(drive_gain(0.5), 5.5);
        assert_eq!(drive_gain(4.0), 10.0);
    }

    #[test]
    fn test_saturate_small_signal_is_nearly_linear() {
        let output = saturate(0.01, 1.0);
        assert!((output - 0.01).abs() < 1e-5);
    }

    #[test]
    fn test_saturate_never_exceeds_unity() {
        assert!(saturate(100.0, 10.0) <= 1.0);
        assert!(saturate(-100.0, 10.0) >= -1.0);
    }

    #[test]
    fn test_bypass_is_identity() {
        let mut stage = DriveStage::new();
        stage.prepare(256);
        stage.set_drive(0.005);

        let input = saw(256, 100);
        let mut buffer = input.clone();
        stage.render(&mut buffer);
        assert_eq!(buffer, input);
    }

    #[test]
    fn test_full_drive_stays_bounded() {
        let mut stage = DriveStage::new();
        stage.prepare(512);
        stage.set_drive(1.0);

        let mut buffer: Vec<f32> = (0..4096)
            .map(|i| (2.0 * PI * 200.0 * i as f32 / 48_000.0).sin())
            .collect();
        stage.render(&mut buffer);

        for &s in &buffer {
            assert!(s.is_finite() && s.abs() <= 1.2, "drive output escaped: {}", s);
        }
    }

    #[test]
    fn test_square_waves_stay_under_ceiling() {
        let mut stage = DriveStage::new();
        stage.prepare(512);

        for drive in [0.02, 0.3, 0.7, 1.0] {
            for period in 2..=16 {
                for amplitude in [1.0, 3.0, 10.0] {
                    stage.reset();
                    stage.set_drive(drive);
                    let mut buffer: Vec<f32> = (0..4096)
                        .map(|i| if (i % period) < period / 2 { amplitude } else { -amplitude })
                        .collect();
                    stage.render(&mut buffer);

                    let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
                    assert!(
                        buffer.iter().all(|s| s.is_finite()) && peak <= OUTPUT_CEILING,
                        "drive {} period {} amplitude {} peaked at {}",
                        drive,
                        period,
                        amplitude,
                        peak
                    );
                }
            }
        }
    }

    #[test]
    fn test_nan_drive_bypasses() {
        let mut stage = DriveStage::new();
        stage.prepare(64);
        stage.set_drive(f32::NAN);
        assert!(stage.is_bypassed());
        assert_eq!(drive_gain(f32::NAN), 1.0);
    }

    #[test]
    fn test_drive_adds_level_to_quiet_signal() {
        let mut stage = DriveStage::new();
        stage.prepare(1024);
        stage.set_drive(1.0);

        let mut buffer: Vec<f32> = (0..4096)
            .map(|i| 0.1 * (2.0 * PI * 200.0 * i as f32 / 48_000.0).sin())
            .collect();
        stage.render(&mut buffer);

        let peak = buffer[2048..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        // tanh(0.1 * 10) ≈ 0.76
        assert!(peak > 0.6 && peak < 0.9, "unexpected driven peak {}", peak);
    }

    #[test]
    fn test_drive_is_clamped() {
        let mut stage = DriveStage::new();
        stage.set_drive(2.0);
        assert_eq!(stage.drive(), 1.0);
        stage.set_drive(-1.0);
        assert_eq!(stage.drive(), 0.0);
        assert!(stage.is_bypassed());
    }
}
