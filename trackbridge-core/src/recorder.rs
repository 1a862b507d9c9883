// File: trackbridge-core/src/recorder.rs
//! In-memory recording of received frames.
//!
//! Lives inside the shared state, so every call here happens with the
//! shared lock held and must never touch the filesystem.

use std::path::PathBuf;
use tracing::{debug, warn};
use trackbridge_common::models::Frame;
use crate::logfile::{default_log_filename, RecordingBuffer};
use crate::save_task::SaveTask;

#[derive(Debug, Default)]
pub struct Recorder {
    recording: bool,
    active: Option<RecordingBuffer>,
    dropped: u64,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.recording = true;
    }

    pub fn stop(&mut self) {
        self.recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Serialize `frame` into the active buffer. Returns `false` when not recording.
    ///
    /// A frame that cannot be encoded is dropped and counted; recording carries on.
    pub fn append(&mut self, frame: &Frame) -> bool {
        if !self.recording {
            return false;
        }
        let buffer = self.active.get_or_insert_with(RecordingBuffer::new);
        match buffer.append(frame) {
            Ok(()) => true,
            Err(e) => {
                self.dropped += 1;
                warn!(
                    "Dropping frame {} from the recording ({} dropped so far): {}",
                    frame.frame_counter, self.dropped, e
                );
                false
            }
        }
    }

    /// Detach everything recorded so far into a [`SaveTask`] and install a
    /// fresh buffer so appends carry on immediately.
    pub fn flush(&mut self, destination: Option<PathBuf>) -> SaveTask {
        let detached = self
            .active
            .replace(RecordingBuffer::new())
            .unwrap_or_default();
        let destination = destination
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(default_log_filename);
        debug!(
            "Detached {} recorded frames for {}",
            detached.len(),
            destination.display()
        );
        SaveTask::new(detached, destination)
    }

    /// Throw away the active buffer without saving.
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Frames waiting in the active buffer.
    pub fn buffered_frames(&self) -> usize {
        self.active.as_ref().map_or(0, RecordingBuffer::len)
    }
}
