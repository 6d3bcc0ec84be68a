#[cfg(feature = "rtrb")]
use rtrb::Consumer;

/// Control events sent from the UI / MIDI thread to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    /// Wheel position 0..=16383, centred on 8192.
    PitchBend { position: u16 },
    /// Release every sounding note.
    AllNotesOff,
    /// Silence every voice immediately, no release tails.
    Panic,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Two queues drained as one, the first taking priority.
impl<A: MessageReceiver, B: MessageReceiver> MessageReceiver for (A, B) {
    fn pop(&mut self) -> Option<SynthMessage> {
        self.0.pop().or_else(|| self.1.pop())
    }
}

/// Receiver that never yields, for driving a synth directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMessages;

impl MessageReceiver for NoMessages {
    fn pop(&mut self) -> Option<SynthMessage> {
        None
    }
}
