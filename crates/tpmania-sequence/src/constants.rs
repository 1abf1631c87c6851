//! Markers, metadata keys and limits of the `.tsq` format.

/// Separates the metadata preamble from the beat buffer.
pub const BUFFER_MARKER: &str = "---";

/// Separates bars inside the beat buffer.
pub const BAR_DIVIDER: &str = ",";

/// Terminates the beat buffer.
pub const FILE_END: &str = ";";

/// Metadata key prefixes recognized in the preamble.
pub const NAME_KEY: &str = "Name: ";
pub const ARTIST_KEY: &str = "Artist: ";
pub const BPM_KEY: &str = "BPM: ";
pub const DIFFICULTY_KEY: &str = "Difficulty: ";
pub const OFFSET_KEY: &str = "Offset: ";

/// Default metadata values for fields missing from the preamble.
pub const DEFAULT_BPM: &str = "0";
pub const DEFAULT_OFFSET: &str = "0";
pub const DEFAULT_DIFFICULTY: &str = "N/A";

/// Beats per bar of a file made of full beats.
pub const FULL_BEATS: u32 = 4;

/// Beats per bar of a file made of half beats.
pub const HALF_BEATS: u32 = 8;

/// Maximum number of beats the device stores.
pub const MAX_BEATS: usize = 300;

/// Beats grouped into each bar when a beat buffer is written out.
pub const BEATS_PER_WRITTEN_BAR: usize = 4;

/// Raw beat cap applied while parsing a file with the given bar width.
///
/// Half-beat files may hold twice as many raw beats since only every second
/// one is transmitted. Other widths are not capped.
pub fn raw_beat_cap(beats_per_bar: u32) -> Option<usize> {
    match beats_per_bar {
        FULL_BEATS => Some(MAX_BEATS),
        HALF_BEATS => Some(MAX_BEATS * 2),
        _ => None,
    }
}
