//! Bounded polling for handshake tokens.

use crate::channel::DeviceChannel;
use crate::config::TransferTiming;
use crate::error::LinkResult;
use log::{debug, trace};
use std::thread;
use std::time::Duration;

/// Result of waiting for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The expected token was read.
    Matched,
    /// The bound elapsed first.
    TimedOut,
}

/// Polls a channel until an expected line arrives or a bound is used up.
///
/// Time is accounted, not measured: an empty read costs the read timeout
/// plus the poll sleep, while a non-matching line costs only a small
/// penalty. Preambles the device prints before its token therefore pass
/// quickly, yet a device that keeps talking cannot hold the host forever.
#[derive(Debug, Clone)]
pub struct ResponseWaiter {
    bound: Duration,
    poll_interval: Duration,
    idle_cost: Duration,
    mismatch_penalty: Duration,
}

impl ResponseWaiter {
    /// Build a waiter using the configured handshake bound.
    pub fn new(timing: &TransferTiming) -> Self {
        ResponseWaiter {
            bound: timing.wait_bound(),
            poll_interval: timing.poll_interval(),
            idle_cost: timing.idle_cost(timing.poll_interval()),
            mismatch_penalty: timing.mismatch_penalty(),
        }
    }

    /// Replace the bound.
    pub fn with_bound(mut self, bound: Duration) -> Self {
        self.bound = bound;
        self
    }

    pub fn bound(&self) -> Duration {
        self.bound
    }

    /// Read lines until `token` arrives or the bound is used up.
    ///
    /// Link failures are returned as errors and never reported as a timeout.
    pub fn wait_for<C: DeviceChannel + ?Sized>(
        &self,
        channel: &mut C,
        token: &str,
    ) -> LinkResult<WaitOutcome> {
        let mut waited = Duration::ZERO;
        while waited < self.bound {
            match channel.read_line()? {
                None => {
                    thread::sleep(self.poll_interval);
                    waited += self.idle_cost;
                    trace!("Waiting for {:?}: {:?} of {:?}", token, waited, self.bound);
                }
                Some(line) if line == token => {
                    debug!("Received {:?}", token);
                    return Ok(WaitOutcome::Matched);
                }
                Some(line) => {
                    debug!("Waiting for {:?}, got {:?}", token, line);
                    waited += self.mismatch_penalty;
                }
            }
        }
        debug!("Timed out waiting for {:?} after {:?}", token, waited);
        Ok(WaitOutcome::TimedOut)
    }
}
