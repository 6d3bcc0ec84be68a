use crate::{
    io::midi::MidiEvent,
    synth::{message::SynthMessage, SynthSound},
};

/// "All Notes Off" channel mode message.
const CC_ALL_NOTES_OFF: u8 = 123;
/// "All Sound Off" channel mode message.
const CC_ALL_SOUND_OFF: u8 = 120;

pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    match midi {
        // Running-status style note-off
        MidiEvent::NoteOn {
            channel,
            key,
            velocity: 0,
        } if channel == channel_filter => Some(SynthMessage::NoteOff {
            note: key,
            velocity: 0,
        }),
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if channel == channel_filter => Some(SynthMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } if channel == channel_filter => Some(SynthMessage::NoteOff {
            note: key,
            velocity,
        }),
        MidiEvent::PitchBend { channel, value } if channel == channel_filter => {
            Some(SynthMessage::PitchBend {
                position: (value as i32 + 8192).clamp(0, 16383) as u16,
            })
        }
        MidiEvent::ControlChange {
            channel,
            controller: CC_ALL_NOTES_OFF,
            ..
        } if channel == channel_filter => Some(SynthMessage::AllNotesOff),
        MidiEvent::ControlChange {
            channel,
            controller: CC_ALL_SOUND_OFF,
            ..
        } if channel == channel_filter => Some(SynthMessage::Panic),
        _ => None,
    }
}

/// Decode raw MIDI bytes into a message for `sound`.
///
/// Channels are one-based when asked of the sound. Note-ons for notes the
/// sound does not cover are dropped; note-offs always pass so nothing hangs.
pub fn decode_for_sound(bytes: &[u8], sound: &SynthSound) -> Option<SynthMessage> {
    let event = MidiEvent::from_bytes(bytes)?;
    let channel = event.channel();
    if !sound.applies_to_channel(channel as i32 + 1) {
        return None;
    }

    match midi_to_synth(event, channel)? {
        SynthMessage::NoteOn { note, .. } if !sound.applies_to_note(note as i32) => None,
        message => Some(message),
    }
}

/// MIDI velocity 0..=127 as a gain-style 0..=1 value.
#[inline]
pub fn velocity_to_unit(velocity: u8) -> f32 {
    velocity.min(127) as f32 / 127.0
}
