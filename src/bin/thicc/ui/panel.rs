//! Status bar and parameter list

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use thicc_dsp::params::{ParamId, SynthParams};

use super::keyboard::{note_name, Keyboard};

/// Width of the per-parameter travel bar, in cells
const BAR_WIDTH: usize = 12;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

/// Human-readable value with units
fn format_value(id: ParamId, value: f32) -> String {
    match id {
        ParamId::Cutoff if value >= 1_000.0 => format!("{:.2} kHz", value / 1_000.0),
        ParamId::Cutoff => format!("{:.0} Hz", value),
        ParamId::LfoRate => format!("{:.2} Hz", value),
        ParamId::AmpAttack
        | ParamId::AmpDecay
        | ParamId::AmpRelease
        | ParamId::FilterAttack
        | ParamId::FilterDecay
        | ParamId::FilterRelease
        | ParamId::GlideTime => {
            if value < 1.0 {
                format!("{:.0} ms", value * 1_000.0)
            } else {
                format!("{:.2} s", value)
            }
        }
        ParamId::SubOctave => format!("-{} oct", value as i32),
        ParamId::UnisonVoices => format!("{}", value as i32),
        _ => format!("{:.0} %", value * 100.0),
    }
}

fn travel_bar(normalized: f32) -> String {
    let filled = (normalized.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Render every parameter, highlighting the selected one
pub fn render_params(frame: &mut Frame, area: Rect, params: &SynthParams, selected: usize) {
    let block = Block::default().title(" Parameters ").borders(Borders::ALL);

    let lines: Vec<Line> = ParamId::ALL
        .iter()
        .enumerate()
        .map(|(index, &id)| {
            let value = params.get(id);
            let style = if index == selected {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::styled(format!(" {:<17}", id.name()), style),
                Span::styled(
                    format!("{} ", travel_bar(params.get_normalized(id))),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(format_value(id, value), Style::default().fg(Color::Gray)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the status bar
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    sample_rate: f64,
    channels: usize,
    keyboard: &Keyboard,
    audio_stats: &AudioStats,
) {
    let block = Block::default().title(" thicc ").borders(Borders::ALL);

    let held: Vec<String> = keyboard.held_notes().map(note_name).collect();
    let held = if held.is_empty() {
        "-".to_string()
    } else {
        held.join(" ")
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {:.1}kHz  {}ch  ", sample_rate / 1_000.0, channels),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Octave {}  ", keyboard.octave()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("Notes: {}  ", held), Style::default().fg(Color::Green)),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", audio_stats.peak, audio_stats.rms),
            Style::default().fg(if audio_stats.peak > 1.0 {
                Color::Red
            } else {
                Color::Magenta
            }),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
