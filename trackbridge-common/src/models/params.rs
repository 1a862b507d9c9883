// File: trackbridge-common/src/models/params.rs

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::models::motion::MotionConfigParams;

pub const DEFAULT_TRACKER_BASE: &str = "OpticalTrackerBase#0";

/// Parameters handed untouched to the [`DeviceConnector`].
///
/// [`DeviceConnector`]: crate::traits::DeviceConnector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceParams {
    /// Geometry definition files the driver should load.
    pub geometry_files: Vec<String>,
    /// How long one blocking receive may wait for a frame.
    pub receive_timeout_ms: u32,
    /// Connect to a specific device; `None` picks the first one found.
    pub serial_number: Option<u64>,
}

impl Default for DeviceParams {
    fn default() -> Self {
        Self {
            geometry_files: vec![
                "geometry004.ini".to_string(),
                "geometry022.ini".to_string(),
                "geometry055.ini".to_string(),
            ],
            receive_timeout_ms: 100,
            serial_number: None,
        }
    }
}

impl DeviceParams {
    pub fn empty() -> Self {
        Self {
            geometry_files: Vec::new(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerParams {
    #[serde(default)]
    pub device: DeviceParams,
    /// Scene name of the optical tracker base; the frame marker poses are measured in.
    pub optical_tracker_base: String,
    /// Targets registered when the controller starts.
    #[serde(default)]
    pub motion_configs: Vec<MotionConfigParams>,
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self::move_bone_params()
    }
}

impl ControllerParams {
    pub fn default_params() -> Self {
        Self::move_bone_params()
    }

    /// No targets, no geometry files.
    pub fn empty_default_params() -> Self {
        Self {
            device: DeviceParams::empty(),
            optical_tracker_base: DEFAULT_TRACKER_BASE.to_string(),
            motion_configs: Vec::new(),
        }
    }

    /// Moves the fiducial object in the tracker base frame.
    pub fn move_tracker_params() -> Self {
        Self {
            device: DeviceParams::default(),
            optical_tracker_base: DEFAULT_TRACKER_BASE.to_string(),
            motion_configs: vec![MotionConfigParams::new(
                "Fiducial#22",
                DEFAULT_TRACKER_BASE,
                "Fiducial#22",
                "22",
            )],
        }
    }

    /// Moves the tracker base relative to a fiducial fixed to the bone.
    pub fn move_bone_params() -> Self {
        Self {
            device: DeviceParams::default(),
            optical_tracker_base: DEFAULT_TRACKER_BASE.to_string(),
            motion_configs: vec![MotionConfigParams::new(
                DEFAULT_TRACKER_BASE,
                "Fiducial#55",
                "Fiducial#55",
                "55",
            )],
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
