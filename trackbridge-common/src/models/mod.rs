// File: trackbridge-common/src/models/mod.rs
pub mod frame;
pub mod motion;
pub mod params;

pub use frame::{Frame, Marker};
pub use motion::{GeometryKey, MotionConfig, MotionConfigParams, ObjectHandle};
pub use params::{ControllerParams, DeviceParams};
