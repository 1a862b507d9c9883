// File: trackbridge-common/src/lib.rs
//! Shared types for the tracker bridge: errors, the frame/config data model,
//! and the traits implemented by the device driver and the scene.

pub mod error;
pub mod models;
pub mod traits;

pub use error::{DeviceError, Error, Result};
