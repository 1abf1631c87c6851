//! Background execution of device operations.
//!
//! Protocol operations block for up to several seconds, so each one runs
//! on its own thread. The registry owns the session and allows a single
//! operation in flight: the channel has no locking of its own.

use crate::error::{CliError, CliResult};
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tpmania_serial_protocol::{Device, DeviceChannel, TimingWindowState, TransferStatus};
use tracing::{debug, warn};

/// Device plus the timing windows being edited against it.
pub struct Session<C> {
    pub device: Device<C>,
    pub windows: TimingWindowState,
}

impl<C: DeviceChannel> Session<C> {
    pub fn new(device: Device<C>) -> Self {
        Session {
            device,
            windows: TimingWindowState::new(),
        }
    }
}

/// Handle for a dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Result of a finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub id: TaskId,
    pub name: String,
    pub status: TransferStatus,
}

/// The operation currently running.
struct InFlight {
    id: TaskId,
    name: String,
    thread: JoinHandle<()>,
}

/// Runs device operations one at a time on worker threads.
pub struct TaskRegistry<C> {
    session: Arc<Mutex<Session<C>>>,
    next_id: u64,
    in_flight: Option<InFlight>,
    report_tx: Sender<TaskReport>,
    report_rx: Receiver<TaskReport>,
}

impl<C: DeviceChannel + Send + 'static> TaskRegistry<C> {
    pub fn new(session: Session<C>) -> Self {
        let (report_tx, report_rx) = crossbeam_channel::unbounded();
        TaskRegistry {
            session: Arc::new(Mutex::new(session)),
            next_id: 0,
            in_flight: None,
            report_tx,
            report_rx,
        }
    }

    /// Whether an operation has been dispatched and its report not yet taken.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start `op` on a new thread.
    ///
    /// Fails without running anything while another operation is outstanding.
    pub fn dispatch<F>(&mut self, name: &str, op: F) -> CliResult<TaskId>
    where
        F: FnOnce(&mut Session<C>) -> TransferStatus + Send + 'static,
    {
        if let Some(current) = &self.in_flight {
            return Err(CliError::Task(format!(
                "cannot start {} while {} ({}) is running",
                name, current.name, current.id
            )));
        }

        let id = TaskId(self.next_id);
        self.next_id += 1;

        let session = Arc::clone(&self.session);
        let report_tx = self.report_tx.clone();
        let task_name = name.to_string();
        let thread = thread::Builder::new()
            .name(format!("{}-{}", id, name))
            .spawn(move || {
                let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
                let status = op(&mut *session);
                let _ = report_tx.send(TaskReport {
                    id,
                    name: task_name,
                    status,
                });
            })?;

        debug!(%id, name, "Dispatched");
        self.in_flight = Some(InFlight {
            id,
            name: name.to_string(),
            thread,
        });
        Ok(id)
    }

    /// Block until the outstanding operation finishes.
    pub fn wait(&mut self) -> CliResult<TaskReport> {
        let in_flight = self
            .in_flight
            .take()
            .ok_or_else(|| CliError::Task("no operation is running".to_string()))?;
        self.collect(in_flight)
    }

    /// Take the report of the outstanding operation if it has finished.
    pub fn try_report(&mut self) -> CliResult<Option<TaskReport>> {
        match &self.in_flight {
            Some(current) if current.thread.is_finished() => {}
            _ => return Ok(None),
        }
        match self.in_flight.take() {
            Some(in_flight) => self.collect(in_flight).map(Some),
            None => Ok(None),
        }
    }

    fn collect(&mut self, in_flight: InFlight) -> CliResult<TaskReport> {
        if in_flight.thread.join().is_err() {
            warn!(id = %in_flight.id, name = %in_flight.name, "Operation panicked");
            return Err(CliError::Task(format!("{} failed", in_flight.name)));
        }
        self.report_rx
            .try_recv()
            .map_err(|_| CliError::Task(format!("{} sent no report", in_flight.name)))
    }

    /// Run `f` on the session between operations.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session<C>) -> R) -> CliResult<R> {
        if self.is_busy() {
            return Err(CliError::Task("an operation is running".to_string()));
        }
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut *session))
    }
}
