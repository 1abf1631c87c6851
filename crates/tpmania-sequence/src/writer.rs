//! `.tsq` output.
//!
//! [`TsqWriter`] emits a sequence file one line at a time, which is how the
//! download protocol rebuilds a file from the device's beat stream.
//! [`regroup`] rewrites an existing file with canonical 4-beat bars.

use crate::constants::*;
use std::io::{self, Write};

/// Line-oriented writer for sequence files.
#[derive(Debug)]
pub struct TsqWriter<W: Write> {
    inner: W,
}

impl<W: Write> TsqWriter<W> {
    /// Wrap an output stream.
    pub fn new(inner: W) -> Self {
        TsqWriter { inner }
    }

    /// Write a preamble line unchanged.
    pub fn preamble_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.inner, "{}", line)
    }

    /// Write the `---` marker that opens the beat buffer.
    pub fn buffer_marker(&mut self) -> io::Result<()> {
        writeln!(self.inner, "{}", BUFFER_MARKER)
    }

    /// Write a single beat line.
    pub fn beat(&mut self, beat: &str) -> io::Result<()> {
        writeln!(self.inner, "{}", beat)
    }

    /// Write a `,` bar divider.
    pub fn bar_divider(&mut self) -> io::Result<()> {
        writeln!(self.inner, "{}", BAR_DIVIDER)
    }

    /// Write the `;` marker and flush.
    pub fn file_end(&mut self) -> io::Result<()> {
        writeln!(self.inner, "{}", FILE_END)?;
        self.inner.flush()
    }

    /// Write a whole beat buffer, grouping beats into bars of four.
    ///
    /// No divider follows the last bar; the `;` marker is written instead.
    pub fn beats<S: AsRef<str>>(&mut self, beats: &[S]) -> io::Result<()> {
        for (i, beat) in beats.iter().enumerate() {
            if i > 0 && i % BEATS_PER_WRITTEN_BAR == 0 {
                self.bar_divider()?;
            }
            self.beat(beat.as_ref())?;
        }
        self.file_end()
    }

    /// Unwrap the output stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Rewrite sequence text with its beat buffer regrouped into 4-beat bars.
///
/// Preamble lines up to and including `---` are copied unchanged. Beats are
/// collected until `;` (or the end of the text) and written back with a
/// divider after every fourth beat.
pub fn regroup<W: Write>(text: &str, out: W) -> io::Result<()> {
    let mut writer = TsqWriter::new(out);
    let mut lines = text.lines();

    for line in lines.by_ref() {
        if line == BUFFER_MARKER {
            writer.buffer_marker()?;
            break;
        }
        writer.preamble_line(line)?;
    }

    let mut beats = Vec::new();
    for line in lines {
        match line {
            FILE_END => break,
            BAR_DIVIDER => continue,
            beat => beats.push(beat),
        }
    }
    writer.beats(&beats)
}
