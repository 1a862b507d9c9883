// File: trackbridge-common/src/traits/device_traits.rs

use crate::error::DeviceError;
use crate::models::{DeviceParams, Frame};

/// Outcome of one [`TrackerDevice::receive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// `frame` now holds a new measurement.
    Frame,
    /// The driver's receive timeout expired; `frame` is untouched.
    Timeout,
}

/// A connected optical tracker.
///
/// Owned by the acquisition thread for its whole life; nothing else ever
/// touches it.
pub trait TrackerDevice: Send {
    /// Block until the next frame is available and write it into `frame`,
    /// or until the driver's own timeout expires.
    ///
    /// The frame is reused between calls, so implementations should
    /// overwrite every field (and clear `markers`) rather than append.
    fn receive(&mut self, frame: &mut Frame) -> Result<Received, DeviceError>;

    fn serial_number(&self) -> u64;

    /// Allocate a frame suitable for [`receive`](Self::receive).
    fn make_frame(&self) -> Frame {
        Frame {
            device_serial: self.serial_number(),
            ..Frame::default()
        }
    }
}

/// Opens a [`TrackerDevice`]. Called once, on the acquisition thread.
pub trait DeviceConnector: Send + 'static {
    fn connect(&self, params: &DeviceParams) -> Result<Box<dyn TrackerDevice>, DeviceError>;
}

impl<F> DeviceConnector for F
where
    F: Fn(&DeviceParams) -> Result<Box<dyn TrackerDevice>, DeviceError> + Send + 'static,
{
    fn connect(&self, params: &DeviceParams) -> Result<Box<dyn TrackerDevice>, DeviceError> {
        self(params)
    }
}
