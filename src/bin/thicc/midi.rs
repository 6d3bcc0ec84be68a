//! Hardware MIDI input
//!
//! Connects to the first MIDI input port, if any. Raw messages are decoded on
//! midir's callback thread and queued for the audio thread alongside the
//! computer keyboard's notes.

use color_eyre::eyre::{eyre, Result as EyreResult};
use midir::{Ignore, MidiInput, MidiInputConnection};
use rtrb::Producer;
use tracing::{debug, info, warn};

use thicc_dsp::{
    io::converter::decode_for_sound,
    synth::{message::SynthMessage, SynthSound},
};

const CLIENT_NAME: &str = "thicc";

/// Open the first input port. `Ok(None)` when the system has no MIDI inputs.
///
/// Dropping the returned connection closes the port.
pub fn connect_first_input(
    mut tx: Producer<SynthMessage>,
) -> EyreResult<Option<MidiInputConnection<()>>> {
    let mut midi_in =
        MidiInput::new(CLIENT_NAME).map_err(|err| eyre!("failed to open MIDI client: {}", err))?;
    midi_in.ignore(Ignore::All);

    let ports = midi_in.ports();
    let Some(port) = ports.first() else {
        info!("no MIDI input ports; computer keyboard only");
        return Ok(None);
    };
    let port_name = midi_in
        .port_name(port)
        .unwrap_or_else(|_| "unknown".to_string());

    let sound = SynthSound;
    let connection = midi_in
        .connect(
            port,
            "thicc-input",
            move |_timestamp, bytes, _| {
                let Some(message) = decode_for_sound(bytes, &sound) else {
                    debug!(?bytes, "ignored MIDI message");
                    return;
                };
                if tx.push(message).is_err() {
                    warn!(?message, "MIDI queue full, event dropped");
                }
            },
            (),
        )
        .map_err(|err| eyre!("failed to connect to MIDI port {}: {}", port_name, err))?;

    info!(port = %port_name, "MIDI input connected");
    Ok(Some(connection))
}
