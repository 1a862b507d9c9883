// File: trackbridge-core/src/controller.rs
//! Top-level owner of the acquisition thread, recorder, target map and save threads.
//!
//! Usage:
//!
//! ```ignore
//! let mut ctl = TrackerController::new(params, connector, resolver, sink);
//! ctl.start()?;
//! loop { ctl.tick()?; }
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};
use trackbridge_common::models::{
    ControllerParams, GeometryKey, MotionConfig, MotionConfigParams, ObjectHandle,
};
use trackbridge_common::traits::{DeviceConnector, HandleResolver, TargetSink};
use trackbridge_common::{DeviceError, Error, Result};
use crate::acquisition::spawn_acquisition;
use crate::save_task::{SaveReport, SaveTaskSet};
use crate::state::{AcquisitionState, Shared};
use crate::targets::TargetMap;
use crate::update::apply_current_frame;

/// Save reports kept for [`TrackerController::save_reports`] before newer ones are dropped.
pub const SAVE_REPORT_BACKLOG: usize = 64;

pub struct TrackerController {
    params: ControllerParams,
    shared: Arc<Shared>,
    resolver: Arc<dyn HandleResolver>,
    sink: Box<dyn TargetSink>,
    connector: Option<Box<dyn DeviceConnector>>,
    /// Set once `start` has resolved every handle.
    tracker_base: Option<ObjectHandle>,
    driver_thread: Option<JoinHandle<()>>,
    save_tasks: Mutex<SaveTaskSet>,
    reports_tx: Sender<SaveReport>,
    reports_rx: Receiver<SaveReport>,
}

impl TrackerController {
    pub fn new(
        params: ControllerParams,
        connector: Box<dyn DeviceConnector>,
        resolver: Arc<dyn HandleResolver>,
        sink: Box<dyn TargetSink>,
    ) -> Self {
        let (reports_tx, reports_rx) = crossbeam_channel::bounded(SAVE_REPORT_BACKLOG);
        Self {
            params,
            shared: Arc::new(Shared::new()),
            resolver,
            sink,
            connector: Some(connector),
            tracker_base: None,
            driver_thread: None,
            save_tasks: Mutex::new(SaveTaskSet::default()),
            reports_tx,
            reports_rx,
        }
    }

    /// Resolve the tracker base and the configured targets, then start acquiring.
    ///
    /// A controller runs once; starting it again is an error.
    pub fn start(&mut self) -> Result<()> {
        let Some(connector) = self.connector.take() else {
            return Err(Error::AlreadyStarted);
        };
        let resolved = self.resolve_initial_handles();
        let (base, initial) = match resolved {
            Ok(v) => v,
            Err(e) => {
                // allow another attempt once the scene is fixed
                self.connector = Some(connector);
                return Err(e);
            }
        };
        {
            let mut state = self.shared.lock();
            for (geometry_id, config) in initial {
                state.targets.insert(geometry_id, config);
            }
        }
        self.tracker_base = Some(base);

        let handle = spawn_acquisition(
            Arc::clone(&self.shared),
            connector,
            self.params.device.clone(),
        )?;
        self.driver_thread = Some(handle);
        info!(
            "Tracker controller started (base {} = {})",
            self.params.optical_tracker_base, base
        );
        Ok(())
    }

    fn resolve_initial_handles(&self) -> Result<(ObjectHandle, Vec<(u32, MotionConfig)>)> {
        let base = self.resolver.resolve_handle(&self.params.optical_tracker_base)?;
        let configs = self
            .params
            .motion_configs
            .iter()
            .map(|p| TargetMap::resolve(p, self.resolver.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok((base, configs))
    }

    /// Stop acquiring and wait for the acquisition thread and every pending save.
    /// Safe to call more than once.
    pub fn stop(&mut self) {
        self.shared.request_stop();
        if let Some(handle) = self.driver_thread.take() {
            if handle.join().is_err() {
                error!("Acquisition thread panicked");
            }
        }
        self.wait_for_saves();
    }

    /// Block until every save started so far has finished.
    pub fn wait_for_saves(&self) {
        self.save_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .join_all();
    }

    /// Handles resolved, no fault, and the device has connected.
    pub fn is_active(&self) -> bool {
        self.tracker_base.is_some()
            && self.shared.fault.get().is_none()
            && self.shared.is_connected()
    }

    pub fn is_recording(&self) -> bool {
        self.is_active() && self.shared.lock().recorder.is_recording()
    }

    pub fn fault(&self) -> Option<DeviceError> {
        self.shared.fault.get().cloned()
    }

    pub fn acquisition_state(&self) -> AcquisitionState {
        self.shared.phase()
    }

    /// Frames published by the acquisition thread so far.
    pub fn frames_received(&self) -> u64 {
        self.shared.lock().frames.swap_count()
    }

    /// Add or replace the target driven by a geometry.
    pub fn add_target(&self, params: MotionConfigParams) -> Result<()> {
        self.shared.fault.check()?;
        let (geometry_id, config) = TargetMap::resolve(&params, self.resolver.as_ref())?;
        let replaced = self.shared.lock().targets.insert(geometry_id, config);
        debug!(
            "Target for geometry {geometry_id} {}: {config:?}",
            if replaced.is_some() { "replaced" } else { "added" }
        );
        Ok(())
    }

    /// Stop updating a geometry's target. Returns whether one was registered.
    pub fn remove_target(&self, geometry_id: impl Into<GeometryKey>) -> Result<bool> {
        self.shared.fault.check()?;
        let geometry_id = geometry_id.into().parse()?;
        Ok(self.shared.lock().targets.remove(geometry_id).is_some())
    }

    /// Drop every target. Device-side geometry configuration is untouched.
    pub fn clear_targets(&self) -> Result<()> {
        self.shared.fault.check()?;
        self.shared.lock().targets.clear();
        Ok(())
    }

    pub fn target_count(&self) -> usize {
        self.shared.lock().targets.len()
    }

    /// Start recording received frames in memory. `false` once faulted.
    pub fn start_recording(&self) -> bool {
        if self.shared.fault.get().is_some() {
            warn!("Not starting a recording: the tracker has faulted");
            return false;
        }
        self.shared.lock().recorder.start();
        true
    }

    pub fn stop_recording(&self) -> bool {
        self.shared.lock().recorder.stop();
        true
    }

    /// Hand everything recorded so far to a background save and keep
    /// recording into a fresh buffer. Returns the destination; the file
    /// appears once the matching [`SaveReport`] is published.
    pub fn save_recording(&self, destination: Option<PathBuf>) -> PathBuf {
        let task = self.shared.lock().recorder.flush(destination);
        let path = task.destination().to_path_buf();
        info!("Saving recording to {}", path.display());
        if let Some(handle) = task.spawn(self.reports_tx.clone()) {
            self.save_tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handle);
        }
        path
    }

    /// Discard the in-memory recording.
    pub fn clear_recording(&self) {
        self.shared.lock().recorder.clear();
    }

    /// Frames recorded and not yet saved.
    pub fn recorded_frame_count(&self) -> usize {
        self.shared.lock().recorder.buffered_frames()
    }

    /// Save threads that have not been joined yet.
    pub fn pending_saves(&self) -> usize {
        let mut tasks = self.save_tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.reap();
        tasks.len()
    }

    /// Outcome of each save, in completion order. At most
    /// [`SAVE_REPORT_BACKLOG`] undrained reports are kept; every outcome is
    /// also logged.
    pub fn save_reports(&self) -> Receiver<SaveReport> {
        self.reports_rx.clone()
    }

    /// Push the current frame's poses to the scene.
    ///
    /// Re-raises a captured acquisition fault. Before the device connects
    /// this does nothing and returns `Ok(0)`.
    pub fn tick(&mut self) -> Result<usize> {
        self.shared.fault.check()?;
        let Some(base) = self.tracker_base else {
            return Ok(0);
        };
        if !self.shared.is_connected() {
            return Ok(0);
        }
        let state = self.shared.lock();
        apply_current_frame(&state, base, self.sink.as_mut())
    }
}

impl Drop for TrackerController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TrackerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerController")
            .field("params", &self.params)
            .field("tracker_base", &self.tracker_base)
            .field("state", &self.shared.phase())
            .field("fault", &self.shared.fault.get())
            .finish()
    }
}
