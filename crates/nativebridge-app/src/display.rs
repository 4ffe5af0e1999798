// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display sinks: where a component's text ends up.

use std::io::Write;

/// Receives text to display. Owned by the host.
pub trait DisplaySink {
    fn show_text(&mut self, text: &str);
}

/// Writes each text as one line.
pub struct LineDisplay<W: Write> {
    out: W,
}

impl<W: Write> LineDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl LineDisplay<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> DisplaySink for LineDisplay<W> {
    fn show_text(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::warn!(error = %e, "display write failed");
        }
    }
}

/// Keeps everything it was asked to show.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingDisplay {
    pub shown: Vec<String>,
}

#[cfg(test)]
impl DisplaySink for RecordingDisplay {
    fn show_text(&mut self, text: &str) {
        self.shown.push(text.to_owned());
    }
}
