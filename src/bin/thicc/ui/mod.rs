//! TUI module for thicc
//!
//! Front panel for the synth: parameter list, oscilloscope, spectrum, and a
//! computer-keyboard piano.

mod keyboard;
mod panel;
mod spectrum;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use thicc_dsp::{
    params::{ParamId, SynthParams},
    synth::message::SynthMessage,
};

use keyboard::Keyboard;
use panel::{render_params, render_status, AudioStats};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 2048;
/// Knob travel per arrow key press
const NORMALIZED_STEP: f32 = 0.02;

/// UI application state
pub struct UiApp {
    /// Samples from the audio thread for visualization
    scope_rx: Consumer<f32>,
    /// Note events to the audio thread
    note_tx: Producer<SynthMessage>,
    params: Arc<SynthParams>,
    keyboard: Keyboard,
    selected: usize,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    sample_rate: f64,
    channels: usize,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        scope_rx: Consumer<f32>,
        note_tx: Producer<SynthMessage>,
        params: Arc<SynthParams>,
        sample_rate: f64,
        channels: usize,
    ) -> Self {
        Self {
            scope_rx,
            note_tx,
            params,
            keyboard: Keyboard::new(),
            selected: 0,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate as f32),
            sample_rate,
            channels,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.spectrum.update(&self.audio_buffer);

            for note in self.keyboard.expired(Instant::now()) {
                self.send(SynthMessage::NoteOff { note, velocity: 0 });
            }

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.send(SynthMessage::AllNotesOff);
        Ok(())
    }

    /// Keep the newest VIS_BUFFER_SIZE samples
    fn poll_audio(&mut self) {
        let available = self.scope_rx.slots();
        if available == 0 {
            return;
        }

        for _ in 0..available {
            if let Ok(sample) = self.scope_rx.pop() {
                self.audio_buffer.push(sample);
            }
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn send(&mut self, msg: SynthMessage) {
        if self.note_tx.push(msg).is_err() {
            warn!(?msg, "note queue full, event dropped");
        }
    }

    fn selected_param(&self) -> ParamId {
        ParamId::ALL[self.selected]
    }

    fn nudge_selected(&mut self, direction: f32) {
        let id = self.selected_param();
        if id.is_discrete() {
            self.params.set(id, self.params.get(id) + direction);
        } else {
            let normalized = self.params.get_normalized(id) + direction * NORMALIZED_STEP;
            self.params.set_normalized(id, normalized);
        }
        debug!(param = id.name(), value = self.params.get(id), "parameter changed");
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => {
                self.selected = self.selected.checked_sub(1).unwrap_or(ParamId::COUNT - 1);
            }
            KeyCode::Down => self.selected = (self.selected + 1) % ParamId::COUNT,
            KeyCode::Left => self.nudge_selected(-1.0),
            KeyCode::Right => self.nudge_selected(1.0),
            KeyCode::Backspace => {
                self.params.reset_to_defaults();
                debug!("parameters reset to defaults");
            }
            KeyCode::Char(' ') => self.send(SynthMessage::AllNotesOff),
            KeyCode::Char('0') => self.send(SynthMessage::Panic),
            KeyCode::Char('z') => self.keyboard.octave_down(),
            KeyCode::Char('x') => self.keyboard.octave_up(),
            KeyCode::Char(c) => {
                if let Some((note, retrigger)) = self.keyboard.press(c, Instant::now()) {
                    if retrigger {
                        self.send(SynthMessage::NoteOff { note, velocity: 0 });
                    }
                    self.send(SynthMessage::NoteOn { note, velocity: 100 });
                }
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(12),   // Params + scopes
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(
            frame,
            rows[0],
            self.sample_rate,
            self.channels,
            &self.keyboard,
            &stats,
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(20)])
            .split(rows[1]);

        render_params(frame, columns[0], &self.params, self.selected);

        let scopes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);
        render_waveform(frame, scopes[0], &self.audio_buffer);
        render_spectrum(frame, scopes[1], self.spectrum.data());

        let help = Paragraph::new(
            " [A-K] Play  [W E T Y U] Sharps  [Z/X] Octave  [↑↓] Select  [←→] Adjust  [Bksp] Defaults  [Space] Release  [0] Panic  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[2]);
    }
}
