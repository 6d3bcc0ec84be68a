//! Oscilloscope widget
//!
//! Starts the trace on the first rising zero crossing so periodic notes stand
//! still, and scales the vertical axis to the signal peak.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Samples shown after the trigger point
const SCOPE_SPAN: usize = 1024;

fn trigger_point(samples: &[f32]) -> usize {
    let search = samples.len().saturating_sub(SCOPE_SPAN);
    samples[..search]
        .windows(2)
        .position(|w| w[0] <= 0.0 && w[1] > 0.0)
        .map(|i| i + 1)
        .unwrap_or(0)
}

pub fn render_waveform(frame: &mut Frame, area: Rect, audio_buffer: &[f32]) {
    let start = trigger_point(audio_buffer);
    let end = (start + SCOPE_SPAN).min(audio_buffer.len());
    let view = &audio_buffer[start..end];

    let data: Vec<(f64, f64)> = view
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64, sample as f64))
        .collect();

    let peak = view.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    let range = (peak as f64 * 1.1).clamp(0.05, 1.5);
    let colour = if peak > 1.0 { Color::Red } else { Color::Cyan };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(colour))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Scope ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, SCOPE_SPAN as f64])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-range, range])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_on_rising_crossing() {
        let mut samples = vec![-0.5; 4];
        samples.extend([0.5; 4]);
        samples.extend(vec![0.0; SCOPE_SPAN]);
        assert_eq!(trigger_point(&samples), 4);
    }

    #[test]
    fn short_buffer_starts_at_zero() {
        assert_eq!(trigger_point(&[0.1, -0.1, 0.2]), 0);
    }
}
