// File: trackbridge-core/src/device/simulated.rs
//! A stand-in tracker that produces smooth synthetic marker motion.
//!
//! Geometry ids come from the configured geometry file names
//! (`geometry055.ini` tracks geometry 55), so the same parameters work
//! against the simulator and real hardware.

use std::f32::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};
use glam::{Affine3A, Quat, Vec3};
use tracing::debug;
use trackbridge_common::models::{DeviceParams, Frame, Marker};
use trackbridge_common::traits::{DeviceConnector, Received, TrackerDevice};
use trackbridge_common::DeviceError;

const DEFAULT_SERIAL: u64 = 0x5F7A_0001;

/// Pull the numeric id out of names like `geometry055.ini`.
pub fn geometry_id_from_filename(name: &str) -> Option<u32> {
    let stem = name.rsplit(['/', '\\']).next()?.split('.').next()?;
    let digits_at = stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    stem[digits_at..].parse().ok()
}

#[derive(Debug)]
pub struct SimulatedTracker {
    serial: u64,
    geometries: Vec<u32>,
    period: Duration,
    started: Instant,
    next_due: Instant,
    counter: u32,
}

impl SimulatedTracker {
    pub fn new(serial: u64, geometries: Vec<u32>, rate_hz: f32) -> Self {
        let period = Duration::from_secs_f32(1.0 / rate_hz.max(1.0));
        let now = Instant::now();
        Self {
            serial,
            geometries,
            period,
            started: now,
            next_due: now,
            counter: 0,
        }
    }

    /// Pose of one geometry at time `t`: a slow orbit about a point 1 m in front of the camera.
    fn pose(index: usize, t: f32) -> Affine3A {
        let phase = t * 0.25 * TAU + index as f32;
        let centre = Vec3::new(0.0, 0.0, 1.0);
        let offset = Vec3::new(phase.cos(), phase.sin(), 0.0) * 0.1;
        Affine3A::from_rotation_translation(Quat::from_rotation_z(phase), centre + offset)
    }
}

impl TrackerDevice for SimulatedTracker {
    fn receive(&mut self, frame: &mut Frame) -> Result<Received, DeviceError> {
        let now = Instant::now();
        if now < self.next_due {
            thread::sleep(self.next_due - now);
        }
        self.next_due += self.period;

        let t = self.started.elapsed().as_secs_f32();
        frame.device_serial = self.serial;
        frame.frame_counter = self.counter;
        frame.device_timestamp_us = self.started.elapsed().as_micros() as u64;
        frame.markers.clear();
        for (i, &geometry_id) in self.geometries.iter().enumerate() {
            let mut marker = Marker::new(geometry_id, Self::pose(i, t));
            marker.index = i as u32;
            marker.presence_mask = 0b1111;
            marker.registration_error_mm = 0.05;
            frame.markers.push(marker);
        }
        self.counter = self.counter.wrapping_add(1);
        Ok(Received::Frame)
    }

    fn serial_number(&self) -> u64 {
        self.serial
    }
}

/// Connects a [`SimulatedTracker`] for the geometry files in the device params.
#[derive(Debug, Clone)]
pub struct SimulatedConnector {
    pub rate_hz: f32,
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self { rate_hz: 330.0 }
    }
}

impl DeviceConnector for SimulatedConnector {
    fn connect(&self, params: &DeviceParams) -> Result<Box<dyn TrackerDevice>, DeviceError> {
        let geometries: Vec<u32> = params
            .geometry_files
            .iter()
            .map(|f| {
                geometry_id_from_filename(f).ok_or_else(|| {
                    DeviceError::Connection(format!("cannot load geometry file '{f}'"))
                })
            })
            .collect::<Result<_, _>>()?;
        let serial = params.serial_number.unwrap_or(DEFAULT_SERIAL);
        debug!("Simulated tracker {serial:#x} tracking geometries {geometries:?}");
        Ok(Box::new(SimulatedTracker::new(serial, geometries, self.rate_hz)))
    }
}
