// File: trackbridge-core/src/acquisition.rs
//! The acquisition thread: connect, then receive frames until told to stop.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace};
use trackbridge_common::models::{DeviceParams, Frame};
use trackbridge_common::traits::{DeviceConnector, Received, TrackerDevice};
use crate::buffers::FrameBuffers;
use crate::state::{AcquisitionState, Shared};

pub(crate) fn spawn_acquisition(
    shared: Arc<Shared>,
    connector: Box<dyn DeviceConnector>,
    params: DeviceParams,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("tracker-acquisition".into())
        .spawn(move || run_acquisition(&shared, connector.as_ref(), &params))
}

/// Runs on the acquisition thread until a stop request or a device fault.
pub(crate) fn run_acquisition(
    shared: &Shared,
    connector: &dyn DeviceConnector,
    params: &DeviceParams,
) {
    shared.set_phase(AcquisitionState::Connecting);
    let (mut device, mut next) = match connect(shared, connector, params) {
        Ok(parts) => parts,
        Err(fault) => {
            shared.fail(fault);
            return;
        }
    };
    shared.set_phase(AcquisitionState::Running);

    while !shared.should_stop() {
        match device.receive(&mut next) {
            Ok(Received::Frame) => {}
            Ok(Received::Timeout) => continue,
            Err(fault) => {
                shared.fail(fault);
                return;
            }
        }
        next.received_at_us = chrono::Utc::now().timestamp_micros();
        trace!(
            "Frame {} with {} markers",
            next.frame_counter,
            next.markers.len()
        );

        let mut state = shared.lock();
        state.recorder.append(&next);
        state.frames.swap(&mut next);
    }

    shared.set_phase(AcquisitionState::Stopped);
    info!("Acquisition loop stopped");
}

fn connect(
    shared: &Shared,
    connector: &dyn DeviceConnector,
    params: &DeviceParams,
) -> Result<(Box<dyn TrackerDevice>, Frame), trackbridge_common::DeviceError> {
    debug!("Connecting to tracker with {:?}", params);
    let device = connector.connect(params)?;
    let next = device.make_frame();
    {
        let mut state = shared.lock();
        state.frames = FrameBuffers::new(device.make_frame());
    }
    shared.set_connected();
    info!("Connected to tracker {}", device.serial_number());
    Ok((device, next))
}
