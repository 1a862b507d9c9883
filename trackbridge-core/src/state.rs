// File: trackbridge-core/src/state.rs
//! State shared between the acquisition thread and the controller.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::error;
use trackbridge_common::{DeviceError, Error, Result};
use crate::buffers::FrameBuffers;
use crate::recorder::Recorder;
use crate::targets::TargetMap;

/// Everything behind the single coarse lock.
#[derive(Debug, Default)]
pub struct SharedState {
    pub frames: FrameBuffers,
    pub targets: TargetMap,
    pub recorder: Recorder,
}

/// The first device failure seen by the acquisition thread. Set at most once.
#[derive(Debug, Default)]
pub struct FaultState {
    fault: OnceLock<DeviceError>,
}

impl FaultState {
    /// Returns `false` if a fault was already stored; the first one wins.
    pub fn capture(&self, fault: DeviceError) -> bool {
        let stored = self.fault.set(fault.clone()).is_ok();
        if stored {
            error!("Acquisition fault captured: {fault}");
        }
        stored
    }

    pub fn get(&self) -> Option<&DeviceError> {
        self.fault.get()
    }

    /// `Err` with the stored fault, if any.
    pub fn check(&self) -> Result<()> {
        match self.fault.get() {
            Some(fault) => Err(Error::Device(fault.clone())),
            None => Ok(()),
        }
    }
}

/// Lifecycle of the acquisition thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AcquisitionState {
    /// Not started yet.
    Idle = 0,
    Connecting = 1,
    Running = 2,
    Stopped = 3,
    Faulted = 4,
}

impl From<u8> for AcquisitionState {
    fn from(v: u8) -> Self {
        match v {
            1 => AcquisitionState::Connecting,
            2 => AcquisitionState::Running,
            3 => AcquisitionState::Stopped,
            4 => AcquisitionState::Faulted,
            _ => AcquisitionState::Idle,
        }
    }
}

#[derive(Debug, Default)]
pub struct Shared {
    state: Mutex<SharedState>,
    pub fault: FaultState,
    should_stop: AtomicBool,
    connected: AtomicBool,
    phase: AtomicU8,
}

impl Shared {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the shared lock. A panic on the other side does not wedge the bridge.
    pub fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn request_stop(&self) {
        self.should_stop.store(true, Ordering::Release);
    }

    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::Acquire)
    }

    pub fn set_connected(&self) {
        self.connected.store(true, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_phase(&self, phase: AcquisitionState) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub fn phase(&self) -> AcquisitionState {
        self.phase.load(Ordering::Acquire).into()
    }

    /// Record a fatal device error and stop the loop.
    pub fn fail(&self, fault: DeviceError) {
        self.fault.capture(fault);
        self.set_phase(AcquisitionState::Faulted);
        self.request_stop();
    }
}
