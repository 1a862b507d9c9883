// File: trackbridge-core/src/save_task.rs
//! Background writers for detached recordings.
//!
//! Each flush produces one [`SaveTask`] that runs on its own thread, owns its
//! buffer outright, and reports through a channel instead of a return value.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, error, info, warn};
use trackbridge_common::{Error, Result};
use crate::logfile::{verify_log_buffer, RecordingBuffer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

/// Published once per finished save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    pub message_count: usize,
    /// Size of the finished container.
    pub byte_len: usize,
    pub outcome: SaveOutcome,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.outcome == SaveOutcome::Saved
    }
}

#[derive(Debug)]
pub struct SaveTask {
    buffer: RecordingBuffer,
    destination: PathBuf,
}

impl SaveTask {
    pub fn new(buffer: RecordingBuffer, destination: PathBuf) -> Self {
        Self { buffer, destination }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn message_count(&self) -> usize {
        self.buffer.len()
    }

    /// Finalize, verify and write the log on the calling thread.
    pub fn run(self) -> SaveReport {
        let message_count = self.buffer.len();
        if self.buffer.is_empty() {
            warn!("Saving an empty recording to {}", self.destination.display());
        }
        let (byte_len, written) = match self.buffer.finish() {
            Ok(bytes) => (bytes.len(), write_verified(&self.destination, &bytes)),
            Err(e) => (0, Err(Error::Save(format!("finalizing failed: {e}")))),
        };
        let outcome = match written {
            Ok(()) => {
                info!(
                    "Saved {} frames ({} bytes) to {}",
                    message_count,
                    byte_len,
                    self.destination.display()
                );
                SaveOutcome::Saved
            }
            Err(e) => {
                error!("Failed to save recording to {}: {}", self.destination.display(), e);
                SaveOutcome::Failed(e.to_string())
            }
        };
        SaveReport {
            path: self.destination,
            message_count,
            byte_len,
            outcome,
        }
    }

    /// Run on a fresh thread. If no thread can be spawned the save runs inline
    /// rather than losing the recording.
    pub fn spawn(self, reports: Sender<SaveReport>) -> Option<JoinHandle<()>> {
        let name = format!("save-{}", self.destination.display());
        let (task_tx, task_rx) = crossbeam_channel::bounded::<SaveTask>(1);
        let tx = reports.clone();
        let spawned = thread::Builder::new().name(name).spawn(move || {
            if let Ok(task) = task_rx.recv() {
                publish(&tx, task.run());
            }
        });
        match spawned {
            Ok(handle) => {
                // capacity 1 and the receiver is alive until it gets this
                let _ = task_tx.send(self);
                Some(handle)
            }
            Err(e) => {
                warn!("Could not spawn save thread ({e}); saving inline");
                publish(&reports, self.run());
                None
            }
        }
    }
}

/// Hand a report to whoever is listening. Never blocks: once the backlog
/// is full further reports are only logged.
fn publish(reports: &Sender<SaveReport>, report: SaveReport) {
    match reports.try_send(report) {
        Ok(()) => {}
        Err(TrySendError::Full(report)) => {
            debug!("Save report backlog full; dropping report for {}", report.path.display());
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}

fn write_verified(path: &Path, bytes: &[u8]) -> Result<()> {
    verify_log_buffer(bytes).map_err(|e| Error::Save(format!("verification failed: {e}")))?;
    std::fs::write(path, bytes)
        .map_err(|e| Error::Save(format!("write to {} failed: {e}", path.display())))
}

/// Outstanding save threads. Finished ones are joined and dropped on every push.
#[derive(Debug, Default)]
pub(crate) struct SaveTaskSet {
    handles: Vec<JoinHandle<()>>,
}

impl SaveTaskSet {
    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.reap();
        self.handles.push(handle);
    }

    /// Join every thread that has already finished.
    pub(crate) fn reap(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) =
            self.handles.drain(..).partition(|h| h.is_finished());
        self.handles = running;
        for handle in done {
            join_logged(handle);
        }
    }

    pub(crate) fn join_all(&mut self) {
        for handle in self.handles.drain(..) {
            join_logged(handle);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}

fn join_logged(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        error!("A save thread panicked");
    }
}
