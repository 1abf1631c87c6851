//! Sequence metadata and the `.tsq` parser.

use crate::constants::*;
use crate::error::SequenceResult;
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Metadata and beat statistics of one sequence file.
///
/// A document is replaced wholesale whenever a new file is selected; it is
/// never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceDocument {
    /// Source file, if the document was loaded from disk.
    pub path: Option<PathBuf>,
    pub name: String,
    pub artist: String,
    /// Tempo as written in the file (decimal text).
    pub bpm: String,
    /// Start offset as written in the file (integer text).
    pub offset: String,
    pub difficulty: String,
    /// Beats in the first bar: 4, 8, or 0 when no bar was completed.
    pub beats_per_bar: u32,
    /// Beats the device will receive, after capping and half-beat halving.
    pub beat_count: usize,
}

impl Default for SequenceDocument {
    fn default() -> Self {
        SequenceDocument {
            path: None,
            name: String::new(),
            artist: String::new(),
            bpm: DEFAULT_BPM.to_string(),
            offset: DEFAULT_OFFSET.to_string(),
            difficulty: DEFAULT_DIFFICULTY.to_string(),
            beats_per_bar: 0,
            beat_count: 0,
        }
    }
}

/// Parser position within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Reading `Key: value` lines.
    Preamble,
    /// Counting the beats of the first bar.
    BarWidth,
    /// Counting the remaining beats.
    Beats,
}

impl SequenceDocument {
    /// Load and parse a sequence file, recording its path.
    pub fn load(path: impl AsRef<Path>) -> SequenceResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut doc = Self::from_reader(BufReader::new(file))?;
        doc.path = Some(path.to_path_buf());
        debug!(
            "Loaded sequence {:?}: {} beats per bar, {} beats",
            path, doc.beats_per_bar, doc.beat_count
        );
        Ok(doc)
    }

    /// Parse a sequence from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> SequenceResult<Self> {
        let mut parser = Parser::new();
        for line in reader.lines() {
            if !parser.feed(&line?) {
                break;
            }
        }
        Ok(parser.finish())
    }

    /// Parse sequence text held in memory.
    pub fn parse_str(text: &str) -> Self {
        let mut parser = Parser::new();
        for line in text.lines() {
            if !parser.feed(line) {
                break;
            }
        }
        parser.finish()
    }

    /// Whether the file encodes half beats (8 per bar).
    pub fn has_half_beats(&self) -> bool {
        self.beats_per_bar == HALF_BEATS
    }

    /// Metadata lines sent to the device ahead of the beats, in wire order.
    ///
    /// The audio length is not part of the file; the caller supplies it as
    /// `MM:SS` text.
    pub fn metadata_lines(&self, audio_length: &str) -> [String; 7] {
        [
            self.name.clone(),
            self.artist.clone(),
            self.bpm.clone(),
            self.difficulty.clone(),
            self.offset.clone(),
            self.beat_count.to_string(),
            audio_length.to_string(),
        ]
    }
}

/// Single forward pass over the lines of a sequence file.
struct Parser {
    doc: SequenceDocument,
    phase: Phase,
    first_bar: u32,
    raw_beats: usize,
}

impl Parser {
    fn new() -> Self {
        Parser {
            doc: SequenceDocument::default(),
            phase: Phase::Preamble,
            first_bar: 0,
            raw_beats: 0,
        }
    }

    /// Consume one line. Returns `false` once parsing is complete.
    fn feed(&mut self, line: &str) -> bool {
        if line == BUFFER_MARKER {
            if self.phase == Phase::Preamble {
                self.phase = Phase::BarWidth;
            }
            return true;
        }
        if line == FILE_END {
            return false;
        }

        match self.phase {
            Phase::Preamble => {
                self.read_metadata(line);
                true
            }
            Phase::BarWidth => {
                if line == BAR_DIVIDER {
                    self.doc.beats_per_bar = self.first_bar;
                    self.phase = Phase::Beats;
                } else {
                    self.first_bar += 1;
                    self.raw_beats += 1;
                }
                true
            }
            Phase::Beats => {
                if line == BAR_DIVIDER {
                    return true;
                }
                if raw_beat_cap(self.doc.beats_per_bar) == Some(self.raw_beats) {
                    return false;
                }
                self.raw_beats += 1;
                true
            }
        }
    }

    fn read_metadata(&mut self, line: &str) {
        let doc = &mut self.doc;
        if let Some(value) = line.strip_prefix(NAME_KEY) {
            doc.name = value.to_string();
        } else if let Some(value) = line.strip_prefix(ARTIST_KEY) {
            doc.artist = value.to_string();
        } else if let Some(value) = line.strip_prefix(BPM_KEY) {
            doc.bpm = value.to_string();
        } else if let Some(value) = line.strip_prefix(OFFSET_KEY) {
            doc.offset = value.to_string();
        } else if let Some(value) = line.strip_prefix(DIFFICULTY_KEY) {
            doc.difficulty = value.to_string();
        }
    }

    fn finish(mut self) -> SequenceDocument {
        // Every second beat is sent, starting with the first.
        self.doc.beat_count = if self.doc.beats_per_bar == HALF_BEATS {
            (self.raw_beats + 1) / 2
        } else {
            self.raw_beats
        };
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_tsq(first_bar: usize, later_beats: usize) -> String {
        let mut text = String::from("Name: Y.E.A.H\nArtist: Someone\nBPM: 128.5\nDifficulty: Hard\nOffset: 120\n---\n");
        for i in 0..first_bar {
            text.push_str(&format!("{}\n", i));
        }
        text.push_str(",\n");
        for i in 0..later_beats {
            text.push_str(&format!("{}\n", first_bar + i));
            if (i + 1) % 4 == 0 && i + 1 < later_beats {
                text.push_str(",\n");
            }
        }
        text.push_str(";\n");
        text
    }

    #[test]
    fn test_parse_metadata() {
        let doc = SequenceDocument::parse_str(&build_tsq(4, 4));
        assert_eq!(doc.name, "Y.E.A.H");
        assert_eq!(doc.artist, "Someone");
        assert_eq!(doc.bpm, "128.5");
        assert_eq!(doc.difficulty, "Hard");
        assert_eq!(doc.offset, "120");
        assert!(doc.path.is_none());
    }

    #[test]
    fn test_missing_metadata_uses_defaults() {
        let doc = SequenceDocument::parse_str("Comment: hello\n---\n1\n2\n3\n4\n,\n;\n");
        assert_eq!(doc.name, "");
        assert_eq!(doc.artist, "");
        assert_eq!(doc.bpm, "0");
        assert_eq!(doc.offset, "0");
        assert_eq!(doc.difficulty, "N/A");
        assert_eq!(doc.beats_per_bar, 4);
        assert_eq!(doc.beat_count, 4);
    }

    #[test]
    fn test_full_beats_counted_exactly() {
        let doc = SequenceDocument::parse_str(&build_tsq(4, 96));
        assert_eq!(doc.beats_per_bar, 4);
        assert_eq!(doc.beat_count, 100);
    }

    #[test]
    fn test_full_beats_at_cap() {
        let doc = SequenceDocument::parse_str(&build_tsq(4, 296));
        assert_eq!(doc.beat_count, 300);
    }

    #[test]
    fn test_full_beats_capped() {
        let doc = SequenceDocument::parse_str(&build_tsq(4, 500));
        assert_eq!(doc.beat_count, 300);
    }

    #[test]
    fn test_half_beats_halved() {
        let doc = SequenceDocument::parse_str(&build_tsq(8, 12));
        assert_eq!(doc.beats_per_bar, 8);
        assert!(doc.has_half_beats());
        assert_eq!(doc.beat_count, 10);
    }

    #[test]
    fn test_half_beats_odd_count_rounds_up() {
        let doc = SequenceDocument::parse_str(&build_tsq(8, 13));
        assert_eq!(doc.beat_count, 11);
    }

    #[test]
    fn test_half_beats_capped() {
        let doc = SequenceDocument::parse_str(&build_tsq(8, 900));
        assert_eq!(doc.beat_count, 300);
    }

    #[test]
    fn test_unterminated_first_bar() {
        let doc = SequenceDocument::parse_str("Name: x\n---\n1\n2\n3\n;\n");
        assert_eq!(doc.beats_per_bar, 0);
        assert_eq!(doc.beat_count, 3);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = build_tsq(4, 8).replace('\n', "\r\n");
        let doc = SequenceDocument::from_reader(text.as_bytes()).unwrap();
        assert_eq!(doc.name, "Y.E.A.H");
        assert_eq!(doc.beats_per_bar, 4);
        assert_eq!(doc.beat_count, 12);
    }

    #[test]
    fn test_lines_after_file_end_ignored() {
        let doc = SequenceDocument::parse_str("---\n1\n2\n3\n4\n,\n5\n;\n6\n7\n");
        assert_eq!(doc.beat_count, 5);
    }

    #[test]
    fn test_metadata_lines_order() {
        let doc = SequenceDocument::parse_str(&build_tsq(4, 4));
        let lines = doc.metadata_lines("03:25");
        assert_eq!(
            lines,
            ["Y.E.A.H", "Someone", "128.5", "Hard", "120", "8", "03:25"].map(String::from)
        );
    }
}
