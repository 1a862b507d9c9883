// File: trackbridge-common/src/traits/mod.rs
pub mod device_traits;
pub mod scene_traits;

pub use device_traits::{DeviceConnector, Received, TrackerDevice};
pub use scene_traits::{HandleResolver, TargetSink};
