//! Sequence upload (host → device).
//!
//! ```text
//! host                         device
//!  | -- 'S' | 'E' | 'B' -------> |
//!  | <------------------- RDY -- |
//!  | -- name, artist, bpm, ----> |
//!  |    difficulty, offset,      |
//!  |    beat count, length       |
//!  |          (settle)           |
//!  | <-------- RDY (EEPROM) ---- |  repeated per beat
//!  | -- beat ------------------> |
//!  |          (settle)           |
//!  | <--------------------- X -- |
//! ```

use crate::channel::DeviceChannel;
use crate::config::TransferTiming;
use crate::constants::{END_TRANSFER, READY_TOKEN};
use crate::error::TransferResult;
use crate::status::{SaveTarget, TransferStatus};
use crate::waiter::{ResponseWaiter, WaitOutcome};
use log::{debug, info, trace};
use std::thread;
use tpmania_sequence::{BeatScanner, SequenceDocument};

/// What to upload and where.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// Parsed sequence; its path is re-read for the beats.
    pub document: &'a SequenceDocument,
    /// Selected destinations.
    pub target: SaveTarget,
    /// Audio length as `MM:SS`.
    pub audio_length: &'a str,
}

/// Progress of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    AwaitReady,
    SendMetadata,
    StreamBeats,
    AwaitEndAck,
    Done,
    TimedOut,
}

/// A single upload run over a channel.
struct Upload<'a, C: ?Sized> {
    channel: &'a mut C,
    timing: &'a TransferTiming,
    waiter: ResponseWaiter,
    state: UploadState,
    beats_sent: usize,
}

impl<'a, C: DeviceChannel + ?Sized> Upload<'a, C> {
    fn enter(&mut self, state: UploadState) {
        debug!("Upload: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Wait for `token`, moving to `TimedOut` if it never arrives.
    fn await_token(&mut self, token: &str) -> TransferResult<bool> {
        match self.waiter.wait_for(&mut *self.channel, token)? {
            WaitOutcome::Matched => Ok(true),
            WaitOutcome::TimedOut => {
                self.enter(UploadState::TimedOut);
                Ok(false)
            }
        }
    }

    fn run(
        &mut self,
        request: &UploadRequest<'_>,
        opcode: u8,
        beats: impl Iterator<Item = std::io::Result<String>>,
    ) -> TransferResult<TransferStatus> {
        let lock_step = request.target.lock_step();

        self.channel.write_opcode(opcode)?;
        self.enter(UploadState::AwaitReady);
        if !self.await_token(READY_TOKEN)? {
            return Ok(TransferStatus::Timeout);
        }

        self.enter(UploadState::SendMetadata);
        for line in request.document.metadata_lines(request.audio_length) {
            self.channel.write_line(&line)?;
        }
        // The device switches buffers before it accepts beats.
        thread::sleep(self.timing.settle());

        self.enter(UploadState::StreamBeats);
        for beat in beats {
            let beat = beat?;
            if lock_step {
                if !self.await_token(READY_TOKEN)? {
                    return Ok(TransferStatus::Timeout);
                }
            } else {
                thread::sleep(self.timing.beat_delay());
            }
            self.channel.write_line(&beat)?;
            self.beats_sent += 1;
            trace!("Sent beat {}: {}", self.beats_sent, beat);
        }

        thread::sleep(self.timing.completion_settle(self.beats_sent));
        self.enter(UploadState::AwaitEndAck);
        if !self.await_token(END_TRANSFER)? {
            return Ok(TransferStatus::Timeout);
        }

        self.enter(UploadState::Done);
        info!(
            "Uploaded {:?} ({} beats) to {:?}",
            request.document.name, self.beats_sent, request.target
        );
        Ok(TransferStatus::Success)
    }
}

/// Upload a parsed sequence to RAM and/or EEPROM.
///
/// Preconditions are checked before anything is written: a loaded sequence
/// (`NoSequenceSelected`), a destination (`SaveLocationUnspecified`) and a
/// readable source file (returned as an error).
///
/// Half-beat files send every second beat and at most 300 beats are sent.
/// EEPROM destinations wait for `RDY` before every beat; RAM-only uploads
/// pace beats with a fixed delay instead.
pub fn upload_sequence<C: DeviceChannel + ?Sized>(
    channel: &mut C,
    request: &UploadRequest<'_>,
    timing: &TransferTiming,
) -> TransferResult<TransferStatus> {
    if request.document.path.is_none() {
        return Ok(TransferStatus::NoSequenceSelected);
    }
    let Some(opcode) = request.target.opcode() else {
        return Ok(TransferStatus::SaveLocationUnspecified);
    };
    let beats = BeatScanner::open(request.document)?;

    let mut upload = Upload {
        channel,
        timing,
        waiter: ResponseWaiter::new(timing),
        state: UploadState::Idle,
        beats_sent: 0,
    };
    upload.run(request, opcode, beats)
}
