//! Terminal clipboard via OSC 52

use crate::controller::Clipboard;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::{self, Write};
use std::sync::Mutex;

/// Escape sequence asking the terminal to place `text` on the system clipboard
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// Clipboard that writes OSC 52 sequences to a terminal stream
pub struct Osc52Clipboard<W: Write + Send> {
    out: Mutex<W>,
}

impl Osc52Clipboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> Clipboard for Osc52Clipboard<W> {
    fn write_text(&self, text: &str) -> io::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("clipboard stream poisoned"))?;
        out.write_all(osc52_sequence(text).as_bytes())?;
        out.flush()
    }
}
