// File: trackbridge-core/src/device/mod.rs
pub mod simulated;

pub use simulated::{SimulatedConnector, SimulatedTracker};
