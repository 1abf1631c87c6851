//! Device session: owns the channel and reports every operation as a status.

use crate::channel::DeviceChannel;
use crate::config::TransferTiming;
use crate::download;
use crate::error::{TransferError, TransferResult};
use crate::status::{MemoryLocation, TransferStatus};
use crate::upload::{self, UploadRequest};
use crate::windows::{self, TimingWindowState};
use log::{info, warn};
use std::path::Path;

/// A connection to one controller.
///
/// Runs one operation at a time. If the channel fails mid-operation it is
/// dropped and the operation reports [`TransferStatus::DeviceNotConnected`];
/// the caller must attach a freshly opened channel before the next one.
pub struct Device<C> {
    channel: Option<C>,
    timing: TransferTiming,
}

impl<C: DeviceChannel> Device<C> {
    /// Create a session with no channel attached.
    pub fn new(timing: TransferTiming) -> Self {
        Device {
            channel: None,
            timing,
        }
    }

    pub fn with_channel(channel: C, timing: TransferTiming) -> Self {
        Device {
            channel: Some(channel),
            timing,
        }
    }

    /// Attach a channel, returning the previous one.
    pub fn attach(&mut self, channel: C) -> Option<C> {
        self.channel.replace(channel)
    }

    /// Detach and return the channel.
    pub fn detach(&mut self) -> Option<C> {
        self.channel.take()
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel_mut(&mut self) -> Option<&mut C> {
        self.channel.as_mut()
    }

    pub fn timing(&self) -> &TransferTiming {
        &self.timing
    }

    /// Run `op` on the channel and turn its outcome into a status.
    fn run<F>(&mut self, name: &str, op: F) -> TransferStatus
    where
        F: FnOnce(&mut C, &TransferTiming) -> TransferResult<TransferStatus>,
    {
        let Some(channel) = self.channel.as_mut() else {
            return TransferStatus::DeviceNotConnected;
        };

        let status = match op(channel, &self.timing) {
            Ok(status) => status,
            Err(TransferError::Link(e)) => {
                warn!("{}: link failed, dropping channel: {}", name, e);
                self.channel = None;
                TransferStatus::DeviceNotConnected
            }
            Err(e) => {
                warn!("{}: {}", name, e);
                TransferStatus::FileAccess
            }
        };

        if status.is_success() {
            info!("{}: {:?}", name, status);
        } else {
            warn!("{}: {:?}", name, status);
        }
        status
    }

    /// Upload a sequence. See [`upload::upload_sequence`].
    pub fn upload_sequence(&mut self, request: &UploadRequest<'_>) -> TransferStatus {
        self.run("upload", |channel, timing| {
            upload::upload_sequence(channel, request, timing)
        })
    }

    /// Download the sequence in `location` to `path`.
    pub fn download_sequence(&mut self, location: MemoryLocation, path: &Path) -> TransferStatus {
        self.run("download", |channel, timing| {
            download::download_sequence(channel, location, path, timing)
        })
    }

    /// Upload the working windows; they become current if the device accepts them.
    pub fn save_timing_windows(&mut self, state: &mut TimingWindowState) -> TransferStatus {
        let status = self.run("save windows", |channel, timing| {
            windows::upload_timing_windows(channel, &state.working, timing)
        });
        if status == TransferStatus::Success {
            state.promote();
        }
        status
    }

    /// Replace both window copies with the ones the device reports.
    pub fn reset_timing_windows(&mut self, state: &mut TimingWindowState) -> TransferStatus {
        self.run("read windows", |channel, timing| {
            let reply = windows::request_timing_windows(channel, timing)?;
            Ok(state.apply_reply(reply))
        })
    }

    /// Restore the default windows and save them to the device.
    pub fn restore_default_timing_windows(&mut self, state: &mut TimingWindowState) -> TransferStatus {
        state.reset_to_defaults();
        self.save_timing_windows(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedChannel;
    use crate::windows::TimingWindowSet;

    fn quick_timing() -> TransferTiming {
        TransferTiming {
            read_timeout_ms: 1,
            poll_interval_ms: 1,
            download_poll_ms: 1,
            settle_ms: 0,
            wait_bound_ms: 50,
            ..TransferTiming::default()
        }
    }

    #[test]
    fn test_no_channel() {
        let mut device: Device<ScriptedChannel> = Device::new(quick_timing());
        let mut state = TimingWindowState::new();
        assert!(!device.is_connected());
        assert_eq!(
            device.save_timing_windows(&mut state),
            TransferStatus::DeviceNotConnected
        );
        assert_eq!(
            device.reset_timing_windows(&mut state),
            TransferStatus::DeviceNotConnected
        );
    }

    #[test]
    fn test_link_failure_drops_channel() {
        let mut channel = ScriptedChannel::new();
        channel.disconnect();
        let mut device = Device::with_channel(channel, quick_timing());
        let mut state = TimingWindowState::new();

        assert_eq!(
            device.save_timing_windows(&mut state),
            TransferStatus::DeviceNotConnected
        );
        assert!(!device.is_connected());
    }

    #[test]
    fn test_detach_returns_channel() {
        let mut device = Device::with_channel(ScriptedChannel::with_replies(["RDY"]), quick_timing());
        let channel = device.detach();
        assert_eq!(channel.map(|c| c.pending_replies()), Some(1));
        assert!(!device.is_connected());
        assert!(device.detach().is_none());

        let mut state = TimingWindowState::new();
        assert_eq!(
            device.reset_timing_windows(&mut state),
            TransferStatus::DeviceNotConnected
        );
    }

    #[test]
    fn test_save_promotes_on_success() {
        let channel = ScriptedChannel::with_replies(["RDY", "X"]);
        let mut device = Device::with_channel(channel, quick_timing());
        let mut state = TimingWindowState::new();
        state.set_working(3, 600);

        assert_eq!(device.save_timing_windows(&mut state), TransferStatus::Success);
        assert_eq!(state.current.values(), &[200, 300, 400, 600]);
        let written = device.channel_mut().map(|c| c.written_text());
        assert_eq!(written.as_deref(), Some("T200\n300\n400\n600\n"));
    }

    #[test]
    fn test_save_keeps_current_on_timeout() {
        let channel = ScriptedChannel::with_replies(["RDY"]);
        let mut device = Device::with_channel(channel, quick_timing());
        let mut state = TimingWindowState::new();
        state.set_working(0, 100);

        assert_eq!(device.save_timing_windows(&mut state), TransferStatus::Timeout);
        assert_eq!(state.current, TimingWindowSet::default());
        assert!(device.is_connected());
    }

    #[test]
    fn test_invalid_windows_write_nothing() {
        let mut device = Device::with_channel(ScriptedChannel::new(), quick_timing());
        let mut state = TimingWindowState::new();
        state.set_working(1, 200);

        assert_eq!(
            device.save_timing_windows(&mut state),
            TransferStatus::TimingWindowOrderInvalid
        );
        assert_eq!(device.channel_mut().map(|c| c.written().len()), Some(0));
    }

    #[test]
    fn test_reset_adopts_device_windows() {
        let channel = ScriptedChannel::with_replies(["210", "310", "410", "510", "X"]);
        let mut device = Device::with_channel(channel, quick_timing());
        let mut state = TimingWindowState::new();

        assert_eq!(device.reset_timing_windows(&mut state), TransferStatus::Success);
        assert_eq!(state.current.values(), &[210, 310, 410, 510]);
        assert_eq!(state.working, state.current);
    }

    #[test]
    fn test_restore_defaults_uploads_them() {
        let channel = ScriptedChannel::with_replies(["RDY", "X"]);
        let mut device = Device::with_channel(channel, quick_timing());
        let mut state = TimingWindowState::new();
        state.adopt_from_device(TimingWindowSet::new([1, 2, 3, 4]));

        assert_eq!(
            device.restore_default_timing_windows(&mut state),
            TransferStatus::Success
        );
        assert_eq!(state.current, TimingWindowSet::default());
    }
}
