// File: trackbridge-core/src/buffers.rs
//! Double-buffered frame handoff between the acquisition thread and the consumer.
//!
//! The "current" slot lives here, behind the shared lock. The "next" slot is
//! a [`Frame`] owned by the acquisition loop so the blocking device receive
//! can fill it without holding the lock; [`FrameBuffers::swap`] exchanges the
//! two in O(1).

use std::mem;
use trackbridge_common::models::Frame;

#[derive(Debug, Default)]
pub struct FrameBuffers {
    current: Frame,
    swaps: u64,
}

impl FrameBuffers {
    pub fn new(current: Frame) -> Self {
        Self { current, swaps: 0 }
    }

    /// The last completed frame. Only valid while the shared lock is held.
    pub fn current(&self) -> &Frame {
        &self.current
    }

    /// Publish `next` as the current frame. `next` receives the previous
    /// current frame so its allocation is reused for the following receive.
    pub fn swap(&mut self, next: &mut Frame) {
        mem::swap(&mut self.current, next);
        self.swaps += 1;
    }

    /// How many frames have been published since allocation.
    pub fn swap_count(&self) -> u64 {
        self.swaps
    }
}
