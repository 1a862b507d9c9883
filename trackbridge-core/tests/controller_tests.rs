// File: trackbridge-core/tests/controller_tests.rs

use std::sync::Arc;
use std::time::Duration;
use glam::{Affine3A, Quat, Vec3};
use trackbridge_common::models::{ControllerParams, GeometryKey, MotionConfigParams, ObjectHandle};
use trackbridge_core::test_utils::{
    marker_frame, scripted_device, wait_until, FrameFeeder, NameResolver, RecordingSink,
    ScriptedConnector,
};
use trackbridge_core::{AcquisitionState, DeviceError, Error, TrackerController};

const WAIT: Duration = Duration::from_secs(5);

fn pose() -> Affine3A {
    Affine3A::from_rotation_translation(
        Quat::from_rotation_z(0.3) * Quat::from_rotation_x(-0.2),
        Vec3::new(0.05, -0.12, 1.4),
    )
}

fn controller(
    params: ControllerParams,
    connector: ScriptedConnector,
) -> (TrackerController, RecordingSink) {
    let sink = RecordingSink::new();
    let ctl = TrackerController::new(
        params,
        Box::new(connector),
        Arc::new(NameResolver::with_defaults()),
        Box::new(sink.clone()),
    );
    (ctl, sink)
}

fn started(params: ControllerParams) -> (TrackerController, FrameFeeder, RecordingSink) {
    let (feeder, connector) = scripted_device();
    let (mut ctl, sink) = controller(params, connector);
    ctl.start().unwrap();
    assert!(wait_until(WAIT, || ctl.is_active()));
    (ctl, feeder, sink)
}

/// Move `object` in the tracker base, driven by the Fiducial#22 geometry.
fn in_base(object: &str, geometry_id: impl Into<GeometryKey>) -> MotionConfigParams {
    MotionConfigParams::new(object, "OpticalTrackerBase#0", "Fiducial#22", geometry_id)
}

fn deliver(
    ctl: &TrackerController,
    feeder: &FrameFeeder,
    counter: u32,
    markers: &[(u32, Affine3A)],
) {
    let before = ctl.frames_received();
    feeder.send(marker_frame(counter, markers));
    assert!(wait_until(WAIT, || ctl.frames_received() > before));
}

#[test]
fn test_tick_before_start_does_nothing() {
    let (_feeder, connector) = scripted_device();
    let (mut ctl, sink) = controller(ControllerParams::default(), connector);

    assert_eq!(ctl.tick().unwrap(), 0);
    assert!(!ctl.is_active());
    assert_eq!(ctl.acquisition_state(), AcquisitionState::Idle);
    assert!(sink.applied().is_empty());
}

#[test]
fn test_tick_with_no_frame_yet_writes_nothing() {
    let (mut ctl, _feeder, sink) = started(ControllerParams::default());
    assert_eq!(ctl.tick().unwrap(), 0);
    assert!(sink.applied().is_empty());
}

#[test]
fn test_move_bone_applies_inverse_measurement() {
    let (mut ctl, feeder, sink) = started(ControllerParams::move_bone_params());
    deliver(&ctl, &feeder, 1, &[(55, pose())]);

    assert_eq!(ctl.tick().unwrap(), 1);
    let applied = sink.applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].target, ObjectHandle(0));
    assert_eq!(applied[0].reference, ObjectHandle(55));
    assert!(applied[0].transform.abs_diff_eq(pose().inverse(), 1e-4));
}

#[test]
fn test_move_tracker_applies_measurement_in_base() {
    let (mut ctl, feeder, sink) = started(ControllerParams::move_tracker_params());
    deliver(&ctl, &feeder, 1, &[(22, pose())]);

    assert_eq!(ctl.tick().unwrap(), 1);
    let applied = sink.applied();
    assert_eq!(applied[0].target, ObjectHandle(22));
    assert_eq!(applied[0].reference, ObjectHandle(0));
    assert!(applied[0].transform.abs_diff_eq(pose(), 1e-4));
}

#[test]
fn test_unconfigured_markers_are_skipped() {
    let (mut ctl, feeder, sink) = started(ControllerParams::move_bone_params());
    deliver(&ctl, &feeder, 1, &[(4, pose()), (55, pose()), (22, pose())]);

    assert_eq!(ctl.tick().unwrap(), 1);
    assert_eq!(sink.applied().len(), 1);
    assert_eq!(sink.applied()[0].reference, ObjectHandle(55));
}

#[test]
fn test_unsupported_frame_is_reported_without_writing() {
    let mut params = ControllerParams::empty_default_params();
    params.motion_configs.push(MotionConfigParams::new(
        "Fiducial#22",
        "Fiducial#55",
        "Fiducial#22",
        "22",
    ));
    let (mut ctl, feeder, sink) = started(params);
    deliver(&ctl, &feeder, 1, &[(22, pose())]);

    match ctl.tick() {
        Err(Error::UnsupportedConfiguration { geometry_id, frame, base }) => {
            assert_eq!(geometry_id, 22);
            assert_eq!(frame, 55);
            assert_eq!(base, 0);
        }
        other => panic!("expected an unsupported configuration, got {other:?}"),
    }
    assert!(sink.applied().is_empty());
}

#[test]
fn test_tick_uses_latest_frame_only() {
    let (mut ctl, feeder, sink) = started(ControllerParams::move_tracker_params());
    let first = Affine3A::from_translation(Vec3::new(0.1, 0.0, 1.0));
    let second = Affine3A::from_translation(Vec3::new(0.2, 0.0, 1.0));
    deliver(&ctl, &feeder, 1, &[(22, first)]);
    deliver(&ctl, &feeder, 2, &[(22, second)]);

    assert_eq!(ctl.tick().unwrap(), 1);
    let applied = sink.applied();
    assert_eq!(applied.len(), 1);
    assert!(applied[0].transform.abs_diff_eq(second, 1e-5));
}

#[test]
fn test_targets_can_be_added_replaced_and_removed() {
    let (mut ctl, feeder, sink) = started(ControllerParams::empty_default_params());
    assert_eq!(ctl.target_count(), 0);

    ctl.add_target(in_base("Fiducial#22", "22")).unwrap();
    ctl.add_target(in_base("Fiducial#4", 22u32)).unwrap();
    assert_eq!(ctl.target_count(), 1);

    deliver(&ctl, &feeder, 1, &[(22, pose())]);
    assert_eq!(ctl.tick().unwrap(), 1);
    assert_eq!(sink.applied()[0].target, ObjectHandle(4));

    assert!(ctl.remove_target("22").unwrap());
    assert!(!ctl.remove_target(22u32).unwrap());
    assert_eq!(ctl.tick().unwrap(), 0);
    assert_eq!(sink.applied().len(), 1);
}

#[test]
fn test_clear_targets() {
    let (mut ctl, feeder, sink) = started(ControllerParams::move_bone_params());
    ctl.clear_targets().unwrap();
    assert_eq!(ctl.target_count(), 0);

    deliver(&ctl, &feeder, 1, &[(55, pose())]);
    assert_eq!(ctl.tick().unwrap(), 0);
    assert!(sink.applied().is_empty());
}

#[test]
fn test_bad_target_input_is_rejected() {
    let (ctl, _feeder, _sink) = started(ControllerParams::empty_default_params());

    let err = ctl.add_target(in_base("Fiducial#22", "twenty")).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));

    let err = ctl.add_target(in_base("Nowhere", "22")).unwrap_err();
    assert!(matches!(err, Error::HandleResolution(_)));
    assert_eq!(ctl.target_count(), 0);
}

#[test]
fn test_unresolvable_initial_config_fails_start() {
    let mut params = ControllerParams::empty_default_params();
    params.optical_tracker_base = "NoSuchBase".into();
    let (_feeder, connector) = scripted_device();
    let (mut ctl, _sink) = controller(params, connector);

    assert!(matches!(ctl.start(), Err(Error::HandleResolution(_))));
    assert!(!ctl.is_active());
    assert_eq!(ctl.acquisition_state(), AcquisitionState::Idle);
}

#[test]
fn test_start_twice_is_rejected() {
    let (mut ctl, _feeder, _sink) = started(ControllerParams::default());
    assert!(matches!(ctl.start(), Err(Error::AlreadyStarted)));
    assert!(ctl.is_active());
}

#[test]
fn test_connect_failure_is_reraised_on_tick() {
    let fault = DeviceError::Connection("no tracker on the bus".into());
    let connector = ScriptedConnector::failing(fault);
    let (mut ctl, sink) = controller(ControllerParams::default(), connector);
    ctl.start().unwrap();

    assert!(wait_until(WAIT, || ctl.fault().is_some()));
    assert_eq!(ctl.acquisition_state(), AcquisitionState::Faulted);
    assert!(!ctl.is_active());

    match ctl.tick() {
        Err(Error::Device(DeviceError::Connection(msg))) => {
            assert_eq!(msg, "no tracker on the bus")
        }
        other => panic!("expected the connection fault, got {other:?}"),
    }
    // still faulted on every later tick
    assert!(ctl.tick().is_err());
    assert!(sink.applied().is_empty());
}

#[test]
fn test_receive_failure_faults_the_controller() {
    let (mut ctl, feeder, _sink) = started(ControllerParams::move_bone_params());
    deliver(&ctl, &feeder, 1, &[(55, pose())]);
    feeder.fail(DeviceError::Receive("frame timeout storm".into()));

    assert!(wait_until(WAIT, || ctl.fault().is_some()));
    assert!(matches!(ctl.tick(), Err(Error::Device(DeviceError::Receive(_)))));
    assert!(!ctl.start_recording());
    assert!(matches!(ctl.clear_targets(), Err(Error::Device(_))));
    ctl.stop();
    assert_eq!(ctl.acquisition_state(), AcquisitionState::Faulted);
}

#[test]
fn test_stop_is_idempotent() {
    let (mut ctl, _feeder, _sink) = started(ControllerParams::default());
    ctl.stop();
    assert_eq!(ctl.acquisition_state(), AcquisitionState::Stopped);
    ctl.stop();
    assert_eq!(ctl.acquisition_state(), AcquisitionState::Stopped);
}

#[test]
fn test_received_frames_carry_a_receive_timestamp() {
    let (ctl, feeder, _sink) = started(ControllerParams::default());
    assert!(ctl.start_recording());
    deliver(&ctl, &feeder, 7, &[(55, pose())]);
    assert_eq!(ctl.recorded_frame_count(), 1);

    let dir = tempfile::tempdir().unwrap();
    let path = ctl.save_recording(Some(dir.path().join("stamp.flik")));
    ctl.wait_for_saves();
    let frames = trackbridge_core::logfile::read_log(&path).unwrap();
    assert_eq!(frames[0].frame_counter, 7);
    assert!(frames[0].received_at_us > 0);
}
