// File: trackbridge-core/tests/recording_tests.rs

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use glam::{Affine3A, Quat, Vec3};
use trackbridge_common::models::ControllerParams;
use trackbridge_core::logfile::{decode_log, read_log, verify_log_buffer};
use trackbridge_core::test_utils::{
    marker_frame, scripted_device, wait_until, FrameFeeder, NameResolver, RecordingSink,
};
use trackbridge_core::{SaveOutcome, TrackerController, SAVE_REPORT_BACKLOG};

const WAIT: Duration = Duration::from_secs(5);

fn started() -> (TrackerController, FrameFeeder) {
    let (feeder, connector) = scripted_device();
    let mut ctl = TrackerController::new(
        ControllerParams::default(),
        Box::new(connector),
        Arc::new(NameResolver::with_defaults()),
        Box::new(RecordingSink::new()),
    );
    ctl.start().unwrap();
    assert!(wait_until(WAIT, || ctl.is_active()));
    (ctl, feeder)
}

fn pose(i: u32) -> Affine3A {
    Affine3A::from_rotation_translation(
        Quat::from_rotation_y(i as f32 * 0.01),
        Vec3::new(0.001 * i as f32, 0.0, 1.2),
    )
}

fn feed(ctl: &TrackerController, feeder: &FrameFeeder, counters: std::ops::RangeInclusive<u32>) {
    let target = ctl.frames_received() + counters.clone().count() as u64;
    for i in counters {
        feeder.send(marker_frame(i, &[(55, pose(i)), (22, pose(i + 1))]));
    }
    assert!(wait_until(WAIT, || ctl.frames_received() == target));
}

fn counters(path: &std::path::Path) -> Vec<u32> {
    read_log(path).unwrap().iter().map(|f| f.frame_counter).collect()
}

#[test]
fn test_recorded_frames_survive_save_in_order() {
    let (ctl, feeder) = started();
    assert!(ctl.start_recording());
    assert!(ctl.is_recording());
    feed(&ctl, &feeder, 1..=20);
    assert_eq!(ctl.recorded_frame_count(), 20);

    let dir = tempfile::tempdir().unwrap();
    let path = ctl.save_recording(Some(dir.path().join("x.flik")));
    assert_eq!(path, dir.path().join("x.flik"));
    ctl.wait_for_saves();

    let report = ctl.save_reports().recv_timeout(WAIT).unwrap();
    assert_eq!(report.outcome, SaveOutcome::Saved);
    assert_eq!(report.message_count, 20);
    assert_eq!(report.path, path);

    let frames = read_log(&path).unwrap();
    assert_eq!(frames.len(), 20);
    for (i, frame) in frames.iter().enumerate() {
        let n = i as u32 + 1;
        let expected = marker_frame(n, &[(55, pose(n)), (22, pose(n + 1))]);
        assert_eq!(frame.frame_counter, expected.frame_counter);
        assert_eq!(frame.device_timestamp_us, expected.device_timestamp_us);
        assert_eq!(frame.markers, expected.markers);
    }

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(verify_log_buffer(&bytes).unwrap().message_count, 20);
}

#[test]
fn test_recording_continues_into_fresh_buffer_after_save() {
    let (ctl, feeder) = started();
    let dir = tempfile::tempdir().unwrap();
    ctl.start_recording();

    feed(&ctl, &feeder, 1..=5);
    let first = ctl.save_recording(Some(dir.path().join("a.flik")));
    assert_eq!(ctl.recorded_frame_count(), 0);
    feed(&ctl, &feeder, 6..=12);
    let second = ctl.save_recording(Some(dir.path().join("b.flik")));
    ctl.wait_for_saves();

    assert_eq!(counters(&first), (1..=5).collect::<Vec<_>>());
    assert_eq!(counters(&second), (6..=12).collect::<Vec<_>>());
    assert_eq!(ctl.pending_saves(), 0);
}

#[test]
fn test_frames_outside_recording_are_not_kept() {
    let (ctl, feeder) = started();
    feed(&ctl, &feeder, 1..=3);
    assert_eq!(ctl.recorded_frame_count(), 0);

    ctl.start_recording();
    feed(&ctl, &feeder, 4..=6);
    assert!(ctl.stop_recording());
    assert!(!ctl.is_recording());
    feed(&ctl, &feeder, 7..=9);
    assert_eq!(ctl.recorded_frame_count(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = ctl.save_recording(Some(dir.path().join("window.flik")));
    ctl.wait_for_saves();
    assert_eq!(counters(&path), vec![4, 5, 6]);
}

#[test]
fn test_empty_save_writes_a_valid_log() {
    let (ctl, _feeder) = started();
    let dir = tempfile::tempdir().unwrap();
    let path = ctl.save_recording(Some(dir.path().join("empty.flik")));
    ctl.wait_for_saves();

    let report = ctl.save_reports().recv_timeout(WAIT).unwrap();
    assert!(report.is_success());
    assert_eq!(report.message_count, 0);
    assert!(read_log(&path).unwrap().is_empty());
}

#[test]
fn test_clear_recording_discards_frames() {
    let (ctl, feeder) = started();
    ctl.start_recording();
    feed(&ctl, &feeder, 1..=4);
    ctl.clear_recording();
    assert_eq!(ctl.recorded_frame_count(), 0);

    feed(&ctl, &feeder, 5..=6);
    let dir = tempfile::tempdir().unwrap();
    let path = ctl.save_recording(Some(dir.path().join("cleared.flik")));
    ctl.wait_for_saves();
    assert_eq!(counters(&path), vec![5, 6]);
}

#[test]
fn test_save_into_missing_directory_reports_failure() {
    let (ctl, feeder) = started();
    ctl.start_recording();
    feed(&ctl, &feeder, 1..=2);

    let dir = tempfile::tempdir().unwrap();
    let path = ctl.save_recording(Some(dir.path().join("missing").join("x.flik")));
    ctl.wait_for_saves();

    let report = ctl.save_reports().recv_timeout(WAIT).unwrap();
    assert!(matches!(report.outcome, SaveOutcome::Failed(_)));
    assert_eq!(report.message_count, 2);
    assert!(!path.exists());
}

#[test]
fn test_stop_waits_for_pending_saves() {
    let (mut ctl, feeder) = started();
    ctl.start_recording();
    feed(&ctl, &feeder, 1..=50);

    let dir = tempfile::tempdir().unwrap();
    let path = ctl.save_recording(Some(dir.path().join("late.flik")));
    ctl.stop();

    assert_eq!(ctl.pending_saves(), 0);
    assert_eq!(read_log(&path).unwrap().len(), 50);
}

#[test]
fn test_saves_during_acquisition_keep_every_frame_once() {
    const FRAMES: u32 = 3000;
    let (mut ctl, feeder) = started();
    ctl.start_recording();
    let dir = tempfile::tempdir().unwrap();

    let streamer = thread::spawn(move || {
        for i in 1..=FRAMES {
            feeder.send(marker_frame(i, &[(55, pose(i))]));
            if i % 50 == 0 {
                thread::sleep(Duration::from_micros(500));
            }
        }
        feeder
    });

    let mut parts = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(30);
    while ctl.frames_received() < u64::from(FRAMES) {
        assert!(Instant::now() < deadline, "acquisition stalled");
        ctl.tick().unwrap();
        let part = dir.path().join(format!("part{:04}.flik", parts.len()));
        parts.push(ctl.save_recording(Some(part)));
        thread::sleep(Duration::from_micros(200));
    }
    let _feeder = streamer.join().unwrap();
    parts.push(ctl.save_recording(Some(dir.path().join("tail.flik"))));
    ctl.wait_for_saves();

    let saved: Vec<u32> = parts.iter().flat_map(|p| counters(p)).collect();
    assert_eq!(saved, (1..=FRAMES).collect::<Vec<_>>());
    assert!(parts.len() > 2);
}

#[cfg(unix)]
#[test]
fn test_save_returns_before_the_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let pipe = dir.path().join("slow.flik");
    let made = std::process::Command::new("mkfifo").arg(&pipe).status().unwrap();
    assert!(made.success());

    let (ctl, feeder) = started();
    let reports = ctl.save_reports();
    ctl.start_recording();
    feed(&ctl, &feeder, 1..=10);

    // the save thread blocks opening the pipe until something reads it
    ctl.save_recording(Some(pipe.clone()));
    let reported_early = reports.try_recv().is_ok();
    let pending = ctl.pending_saves();
    feed(&ctl, &feeder, 11..=12);
    let recorded_meanwhile = ctl.recorded_frame_count();

    let bytes = std::fs::read(&pipe).unwrap();
    ctl.wait_for_saves();

    assert!(!reported_early);
    assert_eq!(pending, 1);
    assert_eq!(recorded_meanwhile, 2);
    let report = reports.recv_timeout(WAIT).unwrap();
    assert_eq!(report.outcome, SaveOutcome::Saved);
    assert_eq!(report.message_count, 10);
    let saved: Vec<u32> = decode_log(&bytes).unwrap().iter().map(|f| f.frame_counter).collect();
    assert_eq!(saved, (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_undrained_save_reports_are_bounded() {
    let (ctl, _feeder) = started();
    let dir = tempfile::tempdir().unwrap();
    for i in 0..SAVE_REPORT_BACKLOG + 8 {
        ctl.save_recording(Some(dir.path().join(format!("{i}.flik"))));
    }
    ctl.wait_for_saves();

    let reports = ctl.save_reports();
    assert_eq!(reports.try_iter().count(), SAVE_REPORT_BACKLOG);
    assert!(dir.path().join(format!("{}.flik", SAVE_REPORT_BACKLOG + 7)).exists());

    ctl.save_recording(Some(dir.path().join("after.flik")));
    ctl.wait_for_saves();
    assert_eq!(reports.try_iter().count(), 1);
}
