// File: trackbridge-core/src/test_utils/helpers.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use glam::Affine3A;
use trackbridge_common::models::{DeviceParams, Frame, Marker, ObjectHandle};
use trackbridge_common::traits::{
    DeviceConnector, HandleResolver, Received, TargetSink, TrackerDevice,
};
use trackbridge_common::{DeviceError, Error, Result};

const POLL: Duration = Duration::from_millis(5);

enum Script {
    Frame(Frame),
    Fail(DeviceError),
}

/// Test-side handle that hands frames (or failures) to a [`ScriptedDevice`].
#[derive(Clone)]
pub struct FrameFeeder {
    tx: Sender<Script>,
}

impl FrameFeeder {
    pub fn send(&self, frame: Frame) {
        let _ = self.tx.send(Script::Frame(frame));
    }

    /// The next receive fails with `fault`.
    pub fn fail(&self, fault: DeviceError) {
        let _ = self.tx.send(Script::Fail(fault));
    }
}

/// A device that delivers exactly what its [`FrameFeeder`] sends, in order.
/// Idle receives time out after a few milliseconds.
pub struct ScriptedDevice {
    rx: Receiver<Script>,
    serial: u64,
}

impl TrackerDevice for ScriptedDevice {
    fn receive(&mut self, frame: &mut Frame) -> std::result::Result<Received, DeviceError> {
        match self.rx.recv_timeout(POLL) {
            Ok(Script::Frame(f)) => {
                *frame = f;
                Ok(Received::Frame)
            }
            Ok(Script::Fail(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Ok(Received::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(POLL);
                Ok(Received::Timeout)
            }
        }
    }

    fn serial_number(&self) -> u64 {
        self.serial
    }
}

pub struct ScriptedConnector {
    device: Mutex<Option<ScriptedDevice>>,
    connect_error: Option<DeviceError>,
}

impl ScriptedConnector {
    /// A connector whose `connect` always fails with `fault`.
    pub fn failing(fault: DeviceError) -> Self {
        Self {
            device: Mutex::new(None),
            connect_error: Some(fault),
        }
    }
}

impl DeviceConnector for ScriptedConnector {
    fn connect(
        &self,
        _params: &DeviceParams,
    ) -> std::result::Result<Box<dyn TrackerDevice>, DeviceError> {
        if let Some(e) = &self.connect_error {
            return Err(e.clone());
        }
        self.device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|d| Box::new(d) as Box<dyn TrackerDevice>)
            .ok_or_else(|| DeviceError::Connection("scripted device already connected".into()))
    }
}

pub fn scripted_device() -> (FrameFeeder, ScriptedConnector) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let connector = ScriptedConnector {
        device: Mutex::new(Some(ScriptedDevice { rx, serial: 0xF00D })),
        connect_error: None,
    };
    (FrameFeeder { tx }, connector)
}

/// Resolves a fixed set of names.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    handles: HashMap<String, ObjectHandle>,
}

impl NameResolver {
    pub fn new(names: &[(&str, i32)]) -> Self {
        Self {
            handles: names
                .iter()
                .map(|(n, h)| (n.to_string(), ObjectHandle(*h)))
                .collect(),
        }
    }

    /// Every object named by the built-in parameter presets.
    pub fn with_defaults() -> Self {
        Self::new(&[
            ("OpticalTrackerBase#0", 0),
            ("Fiducial#22", 22),
            ("Fiducial#55", 55),
            ("Fiducial#4", 4),
        ])
    }
}

impl HandleResolver for NameResolver {
    fn resolve_handle(&self, name: &str) -> Result<ObjectHandle> {
        self.handles
            .get(name)
            .copied()
            .ok_or_else(|| Error::HandleResolution(format!("no object named '{name}'")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTransform {
    pub target: ObjectHandle,
    pub reference: ObjectHandle,
    pub transform: Affine3A,
}

/// Keeps every pose it is given; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    applied: Arc<Mutex<Vec<AppliedTransform>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<AppliedTransform> {
        self.applied.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl TargetSink for RecordingSink {
    fn set_transform(
        &mut self,
        target: ObjectHandle,
        reference: ObjectHandle,
        transform: &Affine3A,
    ) -> Result<()> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AppliedTransform {
                target,
                reference,
                transform: *transform,
            });
        Ok(())
    }
}

/// A frame holding one marker per `(geometry_id, pose)`.
pub fn marker_frame(counter: u32, markers: &[(u32, Affine3A)]) -> Frame {
    Frame {
        device_serial: 0xF00D,
        frame_counter: counter,
        device_timestamp_us: u64::from(counter) * 3_000,
        received_at_us: 0,
        markers: markers
            .iter()
            .enumerate()
            .map(|(i, (id, pose))| Marker {
                index: i as u32,
                ..Marker::new(*id, *pose)
            })
            .collect(),
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
