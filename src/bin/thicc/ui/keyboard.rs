//! Computer keyboard as a one-octave piano
//!
//! Terminals report key presses but not releases, so every note is held for
//! a fixed time and then released. Key repeat while holding a key refreshes
//! the hold.
//!
//!    w e   t y u
//!   a s d f g h j k
//!   C D E F G A B C

use std::time::{Duration, Instant};

/// How long a key press sounds before its automatic note-off
const HOLD_TIME: Duration = Duration::from_millis(350);
const MIN_OCTAVE: i32 = 0;
const MAX_OCTAVE: i32 = 8;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

fn semitone_for_key(key: char) -> Option<i32> {
    let semitone = match key {
        'a' => 0,
        'w' => 1,
        's' => 2,
        'e' => 3,
        'd' => 4,
        'f' => 5,
        't' => 6,
        'g' => 7,
        'y' => 8,
        'h' => 9,
        'u' => 10,
        'j' => 11,
        'k' => 12,
        _ => return None,
    };
    Some(semitone)
}

/// "C4", "A#2", ...
pub fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[note as usize % 12], octave)
}

pub struct Keyboard {
    octave: i32,
    held: Vec<(u8, Instant)>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            octave: 3,
            held: Vec::new(),
        }
    }

    /// Press a key. Returns the note and whether it was already sounding.
    pub fn press(&mut self, key: char, now: Instant) -> Option<(u8, bool)> {
        let semitone = semitone_for_key(key.to_ascii_lowercase())?;
        let note = (12 * (self.octave + 1) + semitone).clamp(0, 127) as u8;

        if let Some(entry) = self.held.iter_mut().find(|(n, _)| *n == note) {
            entry.1 = now;
            return Some((note, true));
        }
        self.held.push((note, now));
        Some((note, false))
    }

    /// Notes whose hold time ran out, removed from the held set.
    pub fn expired(&mut self, now: Instant) -> Vec<u8> {
        let mut released = Vec::new();
        self.held.retain(|&(note, pressed)| {
            let keep = now.duration_since(pressed) < HOLD_TIME;
            if !keep {
                released.push(note);
            }
            keep
        });
        released
    }

    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.held.iter().map(|&(note, _)| note)
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn octave_up(&mut self) {
        self.octave = (self.octave + 1).min(MAX_OCTAVE);
    }

    pub fn octave_down(&mut self) {
        self.octave = (self.octave - 1).max(MIN_OCTAVE);
    }
}
