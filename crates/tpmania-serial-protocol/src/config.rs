//! Link and pacing configuration.

use crate::constants::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest amount of time a single poll is charged against a wait bound.
const MIN_WAIT_STEP: Duration = Duration::from_millis(1);

/// Serial port selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port name (`COM3`, `/dev/ttyACM0`, ...). `None` until one is chosen.
    pub port: Option<String>,
    /// Baud rate.
    pub baud_rate: u32,
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Delays and bounds used by the transfer protocols, in milliseconds.
///
/// The defaults match the controller firmware's pacing at 9600 baud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferTiming {
    /// Per-call read timeout of the channel.
    pub read_timeout_ms: u64,
    /// Sleep after an empty read while waiting for a token.
    pub poll_interval_ms: u64,
    /// Charge for a non-matching line while waiting for a token.
    pub mismatch_penalty_ms: u64,
    /// Sleep after an empty read while receiving a sequence or windows.
    pub download_poll_ms: u64,
    /// Delay before each beat of a RAM-only upload.
    pub beat_delay_ms: u64,
    /// Settle time after the metadata block and before the final ack.
    pub settle_ms: u64,
    /// Extra settle time per beat sent before waiting for the final ack.
    pub per_beat_settle_ms: u64,
    /// Total time a single wait may accumulate before timing out.
    pub wait_bound_ms: u64,
}

impl Default for TransferTiming {
    fn default() -> Self {
        TransferTiming {
            read_timeout_ms: 100,
            poll_interval_ms: 100,
            mismatch_penalty_ms: 2,
            download_poll_ms: 400,
            beat_delay_ms: 2,
            settle_ms: 100,
            per_beat_settle_ms: 1,
            wait_bound_ms: 5000,
        }
    }
}

impl TransferTiming {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Never zero, so a chatty device cannot stall a wait forever.
    pub fn mismatch_penalty(&self) -> Duration {
        Duration::from_millis(self.mismatch_penalty_ms).max(MIN_WAIT_STEP)
    }

    pub fn download_poll(&self) -> Duration {
        Duration::from_millis(self.download_poll_ms)
    }

    pub fn beat_delay(&self) -> Duration {
        Duration::from_millis(self.beat_delay_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Settle time before the final acknowledgement of an upload.
    pub fn completion_settle(&self, beats_sent: usize) -> Duration {
        self.settle() + Duration::from_millis(self.per_beat_settle_ms * beats_sent as u64)
    }

    pub fn wait_bound(&self) -> Duration {
        Duration::from_millis(self.wait_bound_ms)
    }

    /// Time charged against a wait bound for one empty read followed by a
    /// sleep of `sleep`. Never zero.
    pub fn idle_cost(&self, sleep: Duration) -> Duration {
        (sleep + self.read_timeout()).max(MIN_WAIT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let timing = TransferTiming::default();
        assert_eq!(timing.read_timeout(), Duration::from_millis(100));
        assert_eq!(timing.wait_bound(), Duration::from_secs(5));
        assert_eq!(
            timing.completion_settle(300),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn test_zero_costs_are_clamped() {
        let timing = TransferTiming {
            read_timeout_ms: 0,
            mismatch_penalty_ms: 0,
            ..TransferTiming::default()
        };
        assert_eq!(timing.mismatch_penalty(), MIN_WAIT_STEP);
        assert_eq!(timing.idle_cost(Duration::ZERO), MIN_WAIT_STEP);
    }

    #[test]
    fn test_serial_settings_default_baud() {
        let settings = SerialSettings::default();
        assert_eq!(settings.baud_rate, 9600);
        assert!(settings.port.is_none());
    }
}
