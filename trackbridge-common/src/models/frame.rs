// File: trackbridge-common/src/models/frame.rs

use glam::{Affine3A, Mat3, Vec3};
use serde::{Deserialize, Serialize};

/// Millimetres per metre; the device reports translations in millimetres.
const MM_PER_M: f32 = 1000.0;

/// One detected rigid body in a tracker frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Tracking index assigned by the device for this detection.
    pub index: u32,
    /// Geometry the marker was matched against.
    pub geometry_id: u32,
    /// Bit mask of which geometry fiducials were visible.
    pub presence_mask: u32,
    /// Mean registration error, in millimetres.
    pub registration_error_mm: f32,
    /// Translation relative to the tracker, in millimetres.
    pub translation_mm: [f32; 3],
    /// Row-major rotation matrix relative to the tracker.
    pub rotation: [[f32; 3]; 3],
}

impl Marker {
    pub fn new(geometry_id: u32, transform: Affine3A) -> Self {
        let rot = Mat3::from(transform.matrix3).transpose().to_cols_array_2d();
        let t = Vec3::from(transform.translation) * MM_PER_M;
        Self {
            index: 0,
            geometry_id,
            presence_mask: 0,
            registration_error_mm: 0.0,
            translation_mm: t.to_array(),
            rotation: rot,
        }
    }

    /// Marker pose relative to the tracker, translation in metres.
    pub fn transform(&self) -> Affine3A {
        // rows of the device matrix are the columns of its transpose
        let rotation = Mat3::from_cols_array_2d(&self.rotation).transpose();
        let translation = Vec3::from_array(self.translation_mm) / MM_PER_M;
        Affine3A::from_mat3_translation(rotation, translation)
    }
}

/// A snapshot of everything the tracker detected in one acquisition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub device_serial: u64,
    /// Monotonic counter maintained by the device.
    pub frame_counter: u32,
    /// Device clock at exposure, in microseconds.
    pub device_timestamp_us: u64,
    /// Host wall-clock time the frame was received, microseconds since the Unix epoch.
    pub received_at_us: i64,
    pub markers: Vec<Marker>,
}
