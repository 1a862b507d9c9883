// File: trackbridge-core/src/update.rs
//! One consumer-side update: push the current frame's poses to the scene.

use glam::Affine3A;
use tracing::trace;
use trackbridge_common::models::{MotionConfig, ObjectHandle};
use trackbridge_common::traits::TargetSink;
use trackbridge_common::{Error, Result};
use crate::state::SharedState;

/// Pose to apply for one configured marker.
///
/// - moving the tracker base within the measured object's frame: the
///   measurement is inverted (base relative to marker);
/// - any other frame besides the tracker base: unsupported;
/// - otherwise the measurement is applied as is.
pub fn target_transform(
    geometry_id: u32,
    config: &MotionConfig,
    tracker_base: ObjectHandle,
    measured: Affine3A,
) -> Result<Affine3A> {
    if config.object_to_move == tracker_base
        && config.frame_in_which_to_move_object == config.object_being_measured
    {
        Ok(measured.inverse())
    } else if config.frame_in_which_to_move_object != tracker_base {
        Err(Error::UnsupportedConfiguration {
            geometry_id,
            frame: config.frame_in_which_to_move_object.0,
            base: tracker_base.0,
        })
    } else {
        Ok(measured)
    }
}

/// Apply every configured marker of the current frame. The caller holds the
/// shared lock for the whole call. Returns the number of poses written.
pub(crate) fn apply_current_frame(
    state: &SharedState,
    tracker_base: ObjectHandle,
    sink: &mut dyn TargetSink,
) -> Result<usize> {
    let mut applied = 0;
    for marker in &state.frames.current().markers {
        let Some(config) = state.targets.get(marker.geometry_id) else {
            continue;
        };
        let measured = marker.transform();
        let transform = target_transform(marker.geometry_id, config, tracker_base, measured)?;
        trace!(
            "geometry {} -> set {} in {}",
            marker.geometry_id,
            config.object_to_move,
            config.frame_in_which_to_move_object
        );
        sink.set_transform(
            config.object_to_move,
            config.frame_in_which_to_move_object,
            &transform,
        )?;
        applied += 1;
    }
    Ok(applied)
}
