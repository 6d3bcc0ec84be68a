//! Spectrum analyzer widget
//!
//! Hann-windowed FFT folded into log-spaced bands. Each band shows the
//! loudest FFT bin it covers, in dB relative to a full-scale sine, and falls
//! back slowly so filter sweeps stay readable.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

const BANDS: usize = 64;
const MIN_FREQ: f64 = 20.0;
const FLOOR_DB: f64 = -96.0;
/// dB per UI frame a band falls when the signal drops
const RELEASE_DB: f64 = 1.5;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// Full-scale sine magnitude after windowing, the 0 dB reference
    reference: f32,
    /// FFT bin range per band, end exclusive
    band_bins: Vec<(usize, usize)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log10 of band centre in Hz, level in dB)
    bands: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: f32) -> Self {
        let fft_size = fft_size.max(4);
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        let denom = (fft_size - 1) as f32;
        let window: Vec<f32> = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos()))
            .collect();
        let reference = (window.iter().sum::<f32>() * 0.5).max(f32::EPSILON);

        let half = fft_size / 2;
        let bin_hz = sample_rate as f64 / fft_size as f64;
        let max_freq = (sample_rate as f64 / 2.0).min(20_000.0).max(MIN_FREQ * 2.0);
        let ratio = max_freq / MIN_FREQ;

        let mut band_bins = Vec::with_capacity(BANDS);
        let mut bands = Vec::with_capacity(BANDS);
        for band in 0..BANDS {
            let lo = MIN_FREQ * ratio.powf(band as f64 / BANDS as f64);
            let hi = MIN_FREQ * ratio.powf((band + 1) as f64 / BANDS as f64);
            let start = ((lo / bin_hz).floor() as usize).clamp(1, half - 1);
            let end = ((hi / bin_hz).ceil() as usize).clamp(start + 1, half);
            band_bins.push((start, end));
            bands.push(((lo * hi).sqrt().log10(), FLOOR_DB));
        }

        Self {
            window,
            reference,
            band_bins,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            bands,
        }
    }

    /// Analyse `buffer`; ignored unless it matches the FFT size
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (&(start, end), (_, level)) in self.band_bins.iter().zip(self.bands.iter_mut()) {
            let magnitude = self.scratch[start..end]
                .iter()
                .fold(0.0f32, |acc, c| acc.max(c.norm()));
            let db = (20.0 * ((magnitude / self.reference).max(1e-6) as f64).log10()).max(FLOOR_DB);
            *level = db.max(*level - RELEASE_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.bands
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, bands: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(bands);

    let (x_min, x_max) = match (bands.first(), bands.last()) {
        (Some(&(lo, _)), Some(&(hi, _))) if hi > lo => (lo, hi),
        _ => (MIN_FREQ.log10(), 20_000f64.log10()),
    };

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(vec![Span::raw("20"), Span::raw("1k"), Span::raw("20k")])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 6.0])
                .labels(vec![Span::raw("-96"), Span::raw("-48"), Span::raw("0")])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
