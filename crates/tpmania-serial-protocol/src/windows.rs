//! Timing window calibration: upload, device query and the editing state.
//!
//! A window is a threshold in milliseconds bounding one scoring tier
//! (Perfect, Good, OK, Poor). Uploads are validated locally; a set that is
//! not strictly increasing never reaches the wire.

use crate::channel::DeviceChannel;
use crate::config::TransferTiming;
use crate::constants::{DEFAULT_TIMING_WINDOWS, END_TRANSFER, OP_REQUEST_WINDOWS, OP_UPLOAD_WINDOWS, READY_TOKEN, TIMING_WINDOW_COUNT};
use crate::error::TransferResult;
use crate::status::TransferStatus;
use crate::waiter::{ResponseWaiter, WaitOutcome};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread;
use std::time::Duration;

/// Ordered timing windows in milliseconds.
///
/// Usually four entries. A device may report another count, which is kept
/// as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimingWindowSet(Vec<u32>);

impl TimingWindowSet {
    pub fn new(windows: [u32; TIMING_WINDOW_COUNT]) -> Self {
        TimingWindowSet(windows.to_vec())
    }

    pub fn from_values(values: Vec<u32>) -> Self {
        TimingWindowSet(values)
    }

    pub fn values(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every window must be larger than the one before it; equal neighbours fail.
    pub fn is_strictly_increasing(&self) -> bool {
        self.0.windows(2).all(|pair| pair[1] > pair[0])
    }
}

impl Default for TimingWindowSet {
    fn default() -> Self {
        TimingWindowSet::new(DEFAULT_TIMING_WINDOWS)
    }
}

impl fmt::Display for TimingWindowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|w| w.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Tolerance shown next to a window: half of it, with one decimal for odd values.
pub fn error_margin(window: u32) -> f32 {
    window as f32 / 2.0
}

// ============================================================================
// Wire operations
// ============================================================================

/// Send `windows` to the device.
///
/// Returns `TimingWindowOrderInvalid` without writing anything if the set
/// is not strictly increasing.
pub fn upload_timing_windows<C: DeviceChannel + ?Sized>(
    channel: &mut C,
    windows: &TimingWindowSet,
    timing: &TransferTiming,
) -> TransferResult<TransferStatus> {
    if !windows.is_strictly_increasing() {
        debug!("Rejected timing windows {}", windows);
        return Ok(TransferStatus::TimingWindowOrderInvalid);
    }

    let waiter = ResponseWaiter::new(timing);
    channel.write_opcode(OP_UPLOAD_WINDOWS)?;
    if waiter.wait_for(channel, READY_TOKEN)? == WaitOutcome::TimedOut {
        return Ok(TransferStatus::Timeout);
    }

    for window in windows.values() {
        channel.write_line(&window.to_string())?;
    }

    match waiter.wait_for(channel, END_TRANSFER)? {
        WaitOutcome::Matched => {
            info!("Saved timing windows {}", windows);
            Ok(TransferStatus::Success)
        }
        WaitOutcome::TimedOut => Ok(TransferStatus::Timeout),
    }
}

/// What the device answered to a window query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowReply {
    /// One or more windows followed by the end sentinel.
    Windows(TimingWindowSet),
    /// The end sentinel with no windows before it.
    Empty,
    /// A line that is not an integer.
    Malformed(String),
    TimedOut,
}

/// Ask the device for the windows it currently uses.
pub fn request_timing_windows<C: DeviceChannel + ?Sized>(
    channel: &mut C,
    timing: &TransferTiming,
) -> TransferResult<WindowReply> {
    channel.write_opcode(OP_REQUEST_WINDOWS)?;

    let poll = timing.download_poll();
    let idle_cost = timing.idle_cost(poll);
    let bound = timing.wait_bound();
    let mut waited = Duration::ZERO;
    let mut values = Vec::new();

    while waited < bound {
        let Some(line) = channel.read_line()? else {
            thread::sleep(poll);
            waited += idle_cost;
            trace!("Window query idle: {:?} of {:?}", waited, bound);
            continue;
        };

        if line == END_TRANSFER {
            if values.is_empty() {
                return Ok(WindowReply::Empty);
            }
            return Ok(WindowReply::Windows(TimingWindowSet::from_values(values)));
        }

        match line.parse::<u32>() {
            Ok(value) => values.push(value),
            Err(_) => {
                warn!("Unexpected timing window line {:?}", line);
                return Ok(WindowReply::Malformed(line));
            }
        }
    }

    debug!("Window query timed out after {:?}", waited);
    Ok(WindowReply::TimedOut)
}

// ============================================================================
// Editing state
// ============================================================================

/// Windows known to be on the device plus a working copy being edited.
///
/// The working copy only becomes current after the device accepted it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindowState {
    /// Last set confirmed on the device.
    pub current: TimingWindowSet,
    /// Set being edited.
    pub working: TimingWindowSet,
}

impl TimingWindowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change one working window. Returns false if `index` is out of range.
    pub fn set_working(&mut self, index: usize, value: u32) -> bool {
        match self.working.0.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Discard edits.
    pub fn revert_working(&mut self) {
        self.working = self.current.clone();
    }

    /// Take a set reported by the device as both current and working.
    pub fn adopt_from_device(&mut self, windows: TimingWindowSet) {
        if windows.len() != TIMING_WINDOW_COUNT {
            warn!(
                "Device reported {} timing windows, expected {}",
                windows.len(),
                TIMING_WINDOW_COUNT
            );
        }
        self.current = windows.clone();
        self.working = windows;
    }

    /// Working copy was saved; make it current.
    pub fn promote(&mut self) {
        self.current = self.working.clone();
    }

    /// Put the defaults in the working copy; the caller uploads them.
    pub fn reset_to_defaults(&mut self) {
        self.working = TimingWindowSet::default();
    }

    /// Fold a device query result into the state.
    ///
    /// An empty reply falls back to the defaults for both copies.
    pub fn apply_reply(&mut self, reply: WindowReply) -> TransferStatus {
        match reply {
            WindowReply::Windows(windows) => {
                self.adopt_from_device(windows);
                TransferStatus::Success
            }
            WindowReply::Empty => {
                warn!("Device reported no timing windows, using defaults");
                self.adopt_from_device(TimingWindowSet::default());
                TransferStatus::UnknownDeviceResponse
            }
            WindowReply::Malformed(_) => TransferStatus::UnknownDeviceResponse,
            WindowReply::TimedOut => TransferStatus::Timeout,
        }
    }
}
