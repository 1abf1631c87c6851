//! Audio file helpers: track length and sequence pairing.

use crate::error::{CliError, CliResult};
use std::path::Path;

const MS_PER_SEC: u64 = 1000;
const SECS_PER_MIN: u64 = 60;

/// Format a duration as `MM:SS`, rounding seconds half up.
///
/// Minutes are zero padded to two digits and grow past 99 if needed.
pub fn format_mm_ss(ms: u64) -> String {
    let total_secs = (ms + MS_PER_SEC / 2) / MS_PER_SEC;
    format!(
        "{:02}:{:02}",
        total_secs / SECS_PER_MIN,
        total_secs % SECS_PER_MIN
    )
}

/// Parse `MM:SS` text as given with `--length`.
pub fn parse_mm_ss(text: &str) -> CliResult<u64> {
    let invalid = || CliError::Usage(format!("invalid length {:?}, expected MM:SS", text));

    let (minutes, seconds) = text.split_once(':').ok_or_else(invalid)?;
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u64 = seconds.parse().map_err(|_| invalid())?;
    if seconds >= SECS_PER_MIN {
        return Err(invalid());
    }
    Ok((minutes * SECS_PER_MIN + seconds) * MS_PER_SEC)
}

/// Length of a WAV file in milliseconds, from its header.
pub fn wav_length_ms(path: &Path) -> CliResult<u64> {
    let reader = hound::WavReader::open(path)?;
    let rate = u64::from(reader.spec().sample_rate);
    if rate == 0 {
        return Err(CliError::Usage(format!("{} has a zero sample rate", path.display())));
    }
    Ok(u64::from(reader.duration()) * MS_PER_SEC / rate)
}

/// A sequence and its audio must share a file name apart from the extension.
pub fn check_pairing(sequence: &Path, audio: &Path) -> CliResult<()> {
    if sequence.file_stem() == audio.file_stem() {
        Ok(())
    } else {
        Err(CliError::Usage(format!(
            "file names do not match: {} and {}",
            sequence.display(),
            audio.display()
        )))
    }
}
