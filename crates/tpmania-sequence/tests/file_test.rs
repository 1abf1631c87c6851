//! File-backed tests for loading, scanning and regrouping sequences.

use std::fs;
use tpmania_sequence::{regroup, BeatScanner, SequenceDocument, MAX_BEATS};

fn write_half_beat_file(dir: &tempfile::TempDir, raw_beats: usize) -> std::path::PathBuf {
    let mut text = String::from("Name: Half\nArtist: Tester\nBPM: 90\nDifficulty: Easy\nOffset: 0\n---\n");
    for i in 0..raw_beats {
        text.push_str(&format!("{}\n", i * 250));
        if i == 7 || (i > 7 && (i - 7) % 4 == 0) {
            text.push_str(",\n");
        }
    }
    text.push_str(";\n");

    let path = dir.path().join("half.tsq");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_load_records_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_half_beat_file(&dir, 20);

    let doc = SequenceDocument::load(&path).unwrap();
    assert_eq!(doc.path.as_deref(), Some(path.as_path()));
    assert_eq!(doc.name, "Half");
    assert_eq!(doc.beats_per_bar, 8);
    assert_eq!(doc.beat_count, 10);
}

#[test]
fn test_scanner_matches_reported_beat_count() {
    let dir = tempfile::tempdir().unwrap();
    for raw in [9, 20, 21, 599, 600, 700] {
        let path = write_half_beat_file(&dir, raw);
        let doc = SequenceDocument::load(&path).unwrap();
        let sent = BeatScanner::open(&doc).unwrap().count();
        assert_eq!(sent, doc.beat_count, "raw beat count {}", raw);
        assert!(sent <= MAX_BEATS);
    }
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SequenceDocument::load(dir.path().join("absent.tsq")).is_err());
}

#[test]
fn test_regrouped_file_reparses() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_half_beat_file(&dir, 16);
    let text = fs::read_to_string(&path).unwrap();

    let mut out = Vec::new();
    regroup(&text, &mut out).unwrap();
    let doc = SequenceDocument::parse_str(&String::from_utf8(out).unwrap());

    assert_eq!(doc.name, "Half");
    assert_eq!(doc.beats_per_bar, 4);
    assert_eq!(doc.beat_count, 16);
}
