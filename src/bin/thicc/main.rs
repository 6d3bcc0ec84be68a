//! thicc - play the subtractive synth voice from the terminal
//!
//! Run with: cargo run --release
//!
//! Logs go to `thicc.log`; the terminal belongs to the UI.

mod app;
mod midi;
mod ui;

use std::{fs::File, sync::Mutex};

use app::Thicc;
use color_eyre::eyre::WrapErr;
use tracing::Level;

const LOG_FILE: &str = "thicc.log";

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let log = File::create(LOG_FILE).wrap_err_with(|| format!("failed to create {}", LOG_FILE))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .init();

    Thicc::new().run()
}
