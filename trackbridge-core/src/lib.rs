// src/lib.rs

pub mod acquisition;
pub mod buffers;
pub mod controller;
pub mod device;
pub mod logfile;
pub mod recorder;
pub mod save_task;
pub mod state;
pub mod targets;
pub mod test_utils;
pub mod update;

pub use controller::{TrackerController, SAVE_REPORT_BACKLOG};
pub use save_task::{SaveOutcome, SaveReport};
pub use state::AcquisitionState;
pub use trackbridge_common::{DeviceError, Error, Result};
