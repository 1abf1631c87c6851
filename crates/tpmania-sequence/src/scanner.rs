//! Beat extraction for transmission to the device.

use crate::constants::*;
use crate::document::SequenceDocument;
use crate::error::{SequenceError, SequenceResult};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};

/// Iterates the beats of a sequence file in the order they are sent.
///
/// The scanner re-reads the beat buffer of the source file:
/// - lines before the `---` marker and bar dividers are skipped
/// - half-beat files yield only every second beat, starting with the first
/// - iteration stops at the `;` marker or after [`MAX_BEATS`] beats
pub struct BeatScanner<R> {
    lines: Lines<R>,
    half_beats: bool,
    send_next: bool,
    in_buffer: bool,
    yielded: usize,
    done: bool,
}

impl BeatScanner<BufReader<File>> {
    /// Open the source file of a parsed document.
    pub fn open(doc: &SequenceDocument) -> SequenceResult<Self> {
        let path = doc.path.as_ref().ok_or(SequenceError::MissingPath)?;
        let file = File::open(path)?;
        Ok(BeatScanner::new(BufReader::new(file), doc.beats_per_bar))
    }
}

impl<R: BufRead> BeatScanner<R> {
    /// Scan beats from a reader, decimating when `beats_per_bar` is 8.
    pub fn new(reader: R, beats_per_bar: u32) -> Self {
        BeatScanner {
            lines: reader.lines(),
            half_beats: beats_per_bar == HALF_BEATS,
            send_next: true,
            in_buffer: false,
            yielded: 0,
            done: false,
        }
    }

    /// Number of beats yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<R: BufRead> Iterator for BeatScanner<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.yielded == MAX_BEATS {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };

            if !self.in_buffer {
                self.in_buffer = line == BUFFER_MARKER;
                continue;
            }
            if line == BAR_DIVIDER {
                continue;
            }
            if line == FILE_END {
                self.done = true;
                return None;
            }

            if self.half_beats {
                let send = self.send_next;
                self.send_next = !self.send_next;
                if !send {
                    continue;
                }
            }

            self.yielded += 1;
            return Some(Ok(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str, beats_per_bar: u32) -> Vec<String> {
        BeatScanner::new(text.as_bytes(), beats_per_bar)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_skips_preamble_and_dividers() {
        let beats = scan("Name: a\nBPM: 100\n---\n10\n20\n30\n40\n,\n50\n;\n", 4);
        assert_eq!(beats, vec!["10", "20", "30", "40", "50"]);
    }

    #[test]
    fn test_half_beats_take_every_other() {
        let beats = scan("---\n1\n2\n3\n4\n5\n6\n7\n8\n,\n9\n10\n11\n;\n", 8);
        assert_eq!(beats, vec!["1", "3", "5", "7", "9", "11"]);
    }

    #[test]
    fn test_stops_at_max_beats() {
        let mut text = String::from("---\n");
        for i in 0..400 {
            text.push_str(&format!("{}\n", i));
            if i % 4 == 3 {
                text.push_str(",\n");
            }
        }
        text.push_str(";\n");

        let mut scanner = BeatScanner::new(text.as_bytes(), 4);
        let beats: Vec<_> = scanner.by_ref().map(|b| b.unwrap()).collect();
        assert_eq!(beats.len(), MAX_BEATS);
        assert_eq!(beats.last().map(String::as_str), Some("299"));
        assert_eq!(scanner.yielded(), MAX_BEATS);
    }

    #[test]
    fn test_no_buffer_yields_nothing() {
        assert!(scan("Name: a\nArtist: b\n", 4).is_empty());
    }

    #[test]
    fn test_open_requires_path() {
        let doc = SequenceDocument::default();
        assert!(matches!(
            BeatScanner::open(&doc),
            Err(SequenceError::MissingPath)
        ));
    }
}
