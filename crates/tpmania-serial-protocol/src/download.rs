//! Sequence download (device → host).
//!
//! The device streams its preamble lines, the `---` marker, then one line
//! per beat and finally the bare `X` sentinel. It never marks bar
//! boundaries, so the host regroups beats into bars of four. After every
//! fourth beat one line of lookahead decides whether a divider is needed:
//! if the next line is the sentinel the file ends without a trailing `,`.

use crate::channel::DeviceChannel;
use crate::config::TransferTiming;
use crate::constants::END_TRANSFER;
use crate::error::TransferResult;
use crate::status::{MemoryLocation, TransferStatus};
use log::{debug, info, trace};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tpmania_sequence::{TsqWriter, BEATS_PER_WRITTEN_BAR, BUFFER_MARKER};

/// Progress of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Request opcode not yet sent.
    Idle,
    /// Opcode sent, waiting for the device to start streaming.
    RequestSent,
    /// Copying preamble lines verbatim.
    CopyPreamble,
    /// Writing beats and bar dividers.
    CountBeats,
    Done,
    TimedOut,
}

/// A single download run over a channel.
struct Download<'a, C: ?Sized, W: Write> {
    channel: &'a mut C,
    writer: TsqWriter<W>,
    state: DownloadState,
    /// Line read ahead after a full bar, consumed by the next iteration.
    pending: Option<String>,
    beats_in_bar: usize,
    beats_total: usize,
    waited: Duration,
    bound: Duration,
    poll: Duration,
    idle_cost: Duration,
}

impl<'a, C: DeviceChannel + ?Sized, W: Write> Download<'a, C, W> {
    fn enter(&mut self, state: DownloadState) {
        debug!("Download: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Next line from the lookahead slot or the channel.
    ///
    /// Empty reads sleep and are charged against the bound, which is shared
    /// by the whole transfer. Returns `None` once the bound is used up.
    fn next_line(&mut self) -> TransferResult<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        while self.waited < self.bound {
            if let Some(line) = self.channel.read_line()? {
                return Ok(Some(line));
            }
            thread::sleep(self.poll);
            self.waited += self.idle_cost;
            trace!("Download idle: {:?} of {:?}", self.waited, self.bound);
        }
        Ok(None)
    }

    fn finish(&mut self, location: MemoryLocation) -> TransferResult<TransferStatus> {
        self.writer.file_end()?;
        self.enter(DownloadState::Done);
        info!(
            "Received sequence from {} ({} beats)",
            location.as_str(),
            self.beats_total
        );
        Ok(TransferStatus::Received(location))
    }

    fn timed_out(&mut self) -> TransferStatus {
        self.enter(DownloadState::TimedOut);
        TransferStatus::Timeout
    }

    fn run(&mut self, location: MemoryLocation, settle: Duration) -> TransferResult<TransferStatus> {
        self.channel.write_opcode(location.request_opcode())?;
        self.enter(DownloadState::RequestSent);
        thread::sleep(settle);

        self.enter(DownloadState::CopyPreamble);
        loop {
            let Some(line) = self.next_line()? else {
                return Ok(self.timed_out());
            };
            if line == BUFFER_MARKER {
                self.writer.buffer_marker()?;
                break;
            }
            if line == END_TRANSFER {
                info!("No sequence stored in {}", location.as_str());
                self.enter(DownloadState::Done);
                return Ok(TransferStatus::NoSequenceOnDevice);
            }
            self.writer.preamble_line(&line)?;
        }

        self.enter(DownloadState::CountBeats);
        loop {
            let Some(line) = self.next_line()? else {
                return Ok(self.timed_out());
            };
            if line == END_TRANSFER {
                return self.finish(location);
            }
            self.writer.beat(&line)?;
            self.beats_in_bar += 1;
            self.beats_total += 1;

            if self.beats_in_bar == BEATS_PER_WRITTEN_BAR {
                self.beats_in_bar = 0;
                let Some(next) = self.next_line()? else {
                    return Ok(self.timed_out());
                };
                if next == END_TRANSFER {
                    return self.finish(location);
                }
                self.writer.bar_divider()?;
                self.pending = Some(next);
            }
        }
    }
}

/// Request the sequence stored in `location` and write it to `out`.
///
/// Output already written is kept if the transfer times out.
pub fn download_into<C, W>(
    channel: &mut C,
    location: MemoryLocation,
    out: W,
    timing: &TransferTiming,
) -> TransferResult<TransferStatus>
where
    C: DeviceChannel + ?Sized,
    W: Write,
{
    let mut download = Download {
        channel,
        writer: TsqWriter::new(out),
        state: DownloadState::Idle,
        pending: None,
        beats_in_bar: 0,
        beats_total: 0,
        waited: Duration::ZERO,
        bound: timing.wait_bound(),
        poll: timing.download_poll(),
        idle_cost: timing.idle_cost(timing.download_poll()),
    };
    download.run(location, timing.settle())
}

/// Request the sequence stored in `location` and save it as a `.tsq` file.
///
/// The file is created before the request is sent, so an unwritable path
/// costs no wire traffic. A partial file is left behind on timeout.
pub fn download_sequence<C: DeviceChannel + ?Sized>(
    channel: &mut C,
    location: MemoryLocation,
    path: &Path,
    timing: &TransferTiming,
) -> TransferResult<TransferStatus> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    let status = download_into(channel, location, &mut out, timing)?;
    out.flush()?;
    Ok(status)
}
