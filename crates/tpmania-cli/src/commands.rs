//! Command implementations.
//!
//! Local commands (`inspect`, `regroup`) work on files only. Device commands
//! run through a [`TaskRegistry`] so the blocking transfer happens off the
//! calling thread.

use crate::audio::{check_pairing, format_mm_ss, parse_mm_ss, wav_length_ms};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::tasks::{Session, TaskRegistry};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tpmania_sequence::{regroup, SequenceDocument};
use tpmania_serial_protocol::{
    error_margin, open_serial, Device, DeviceChannel, MemoryLocation, SaveTarget, SerialChannel,
    TimingWindowSet, TransferStatus, UploadRequest, TIMING_WINDOW_COUNT,
};
use tracing::{info, warn};

/// Tier names in window order.
const WINDOW_LABELS: [&str; TIMING_WINDOW_COUNT] = ["Perfect", "Good", "OK", "Poor"];

// ============================================================================
// Local commands
// ============================================================================

/// Describe a sequence file, as text or JSON.
pub fn inspect(path: &Path, json: bool) -> CliResult<String> {
    let doc = SequenceDocument::load(path)?;
    if json {
        return Ok(serde_json::to_string_pretty(&doc)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Name:          {}", doc.name);
    let _ = writeln!(out, "Artist:        {}", doc.artist);
    let _ = writeln!(out, "BPM:           {}", doc.bpm);
    let _ = writeln!(out, "Difficulty:    {}", doc.difficulty);
    let _ = writeln!(out, "Offset:        {}", doc.offset);
    let _ = writeln!(out, "Beats per bar: {}", doc.beats_per_bar);
    let _ = write!(out, "Beats sent:    {}", doc.beat_count);
    if doc.has_half_beats() {
        out.push_str(" (half beats, every second beat is sent)");
    }
    Ok(out)
}

/// Rewrite `input` into `output` with 4-beat bars.
pub fn regroup_file(input: &Path, output: &Path) -> CliResult<()> {
    let text = fs::read_to_string(input)?;
    let out = BufWriter::new(File::create(output)?);
    regroup(&text, out)?;
    info!(input = %input.display(), output = %output.display(), "Regrouped sequence");
    Ok(())
}

/// Render windows with their tolerances, one per line.
pub fn format_windows(windows: &TimingWindowSet) -> String {
    let mut out = String::new();
    for (i, window) in windows.values().iter().enumerate() {
        let label = WINDOW_LABELS.get(i).copied().unwrap_or("Window");
        let _ = writeln!(out, "{:<8} {} ms (+/- {} ms)", label, window, error_margin(*window));
    }
    if let Some(last) = windows.values().last() {
        let _ = write!(out, "{:<8} +{} ms", "Miss", last);
    }
    out
}

// ============================================================================
// Connection
// ============================================================================

/// Open the configured port and wrap it in a task registry.
///
/// A port that is unset or cannot be opened leaves the device without a
/// channel, so every device command reports `DeviceNotConnected`.
pub fn connect(config: &AppConfig) -> TaskRegistry<SerialChannel> {
    let device = match open_serial(&config.serial, &config.timing) {
        Ok(channel) => {
            info!(port = ?config.serial.port, baud = config.serial.baud_rate, "Connected");
            Device::with_channel(channel, config.timing.clone())
        }
        Err(e) => {
            warn!(port = ?config.serial.port, "Not connected: {}", e);
            Device::new(config.timing.clone())
        }
    };
    TaskRegistry::new(Session::new(device))
}

// ============================================================================
// Uploads
// ============================================================================

/// Options of the `upload` command.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub file: PathBuf,
    pub target: SaveTarget,
    /// WAV file paired with the sequence; its length is sent to the device.
    pub audio: Option<PathBuf>,
    /// Length as `MM:SS` when no audio file is given.
    pub length: Option<String>,
}

/// Load the sequence and work out the audio length text.
///
/// Usage problems surface here, before a device operation is started.
pub fn prepare_upload(options: &UploadOptions) -> CliResult<(SequenceDocument, String)> {
    let length_ms = match (&options.audio, &options.length) {
        (Some(_), Some(_)) => {
            return Err(CliError::Usage(
                "give either --audio or --length, not both".to_string(),
            ))
        }
        (Some(audio), None) => {
            check_pairing(&options.file, audio)?;
            wav_length_ms(audio)?
        }
        (None, Some(length)) => parse_mm_ss(length)?,
        (None, None) => {
            warn!("No audio length given, sending 00:00");
            0
        }
    };

    let doc = SequenceDocument::load(&options.file)?;
    Ok((doc, format_mm_ss(length_ms)))
}

/// Upload a sequence and wait for the outcome.
pub fn upload<C: DeviceChannel + Send + 'static>(
    tasks: &mut TaskRegistry<C>,
    doc: SequenceDocument,
    target: SaveTarget,
    audio_length: String,
) -> CliResult<TransferStatus> {
    tasks.dispatch("upload", move |session| {
        let request = UploadRequest {
            document: &doc,
            target,
            audio_length: &audio_length,
        };
        session.device.upload_sequence(&request)
    })?;
    Ok(tasks.wait()?.status)
}

/// Download the sequence stored in `location` to `output`.
pub fn download<C: DeviceChannel + Send + 'static>(
    tasks: &mut TaskRegistry<C>,
    location: MemoryLocation,
    output: PathBuf,
) -> CliResult<TransferStatus> {
    tasks.dispatch("download", move |session| {
        session.device.download_sequence(location, &output)
    })?;
    Ok(tasks.wait()?.status)
}

// ============================================================================
// Timing windows
// ============================================================================

/// Read the windows from the device.
pub fn windows_get<C: DeviceChannel + Send + 'static>(
    tasks: &mut TaskRegistry<C>,
) -> CliResult<(TransferStatus, TimingWindowSet)> {
    tasks.dispatch("read windows", |session| {
        session.device.reset_timing_windows(&mut session.windows)
    })?;
    let status = tasks.wait()?.status;
    let windows = tasks.with_session(|session| session.windows.current.clone())?;
    Ok((status, windows))
}

/// Save four windows to the device.
pub fn windows_set<C: DeviceChannel + Send + 'static>(
    tasks: &mut TaskRegistry<C>,
    values: [u32; TIMING_WINDOW_COUNT],
) -> CliResult<TransferStatus> {
    tasks.with_session(|session| session.windows.working = TimingWindowSet::new(values))?;
    tasks.dispatch("save windows", |session| {
        session.device.save_timing_windows(&mut session.windows)
    })?;
    Ok(tasks.wait()?.status)
}

/// Save the default windows to the device.
pub fn windows_reset<C: DeviceChannel + Send + 'static>(
    tasks: &mut TaskRegistry<C>,
) -> CliResult<TransferStatus> {
    tasks.dispatch("restore windows", |session| {
        session.device.restore_default_timing_windows(&mut session.windows)
    })?;
    Ok(tasks.wait()?.status)
}
