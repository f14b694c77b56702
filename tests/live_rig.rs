//! Live Rig Tests
//!
//! Full lifecycle against the simulated client:
//! - Background and retimed acquisition feeding the update tick
//! - Reconnect and shutdown ordering
//! - Rigid bodies
//! - Capture file → replay → mirrored hierarchy
//!
//! Run with: `cargo test --test live_rig`

mod common;

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use mocap_retarget::io::bag::{BagPlayer, BagRecorder, SimulatedClient, synth};
use mocap_retarget::scene::TransformWrite;
use mocap_retarget::{
    AcquisitionMode, ConnectionState, Hierarchy, LiveRig, QueryStatus, RetargetOptions,
    SceneGraph, StreamSession, Timestamped, Vec3, mirror_subject,
};

use common::*;

fn arm_frames(n: u32) -> Vec<mocap_retarget::io::bag::FrameSnapshot> {
    (0..n)
        .map(|i| frame(i, vec![arm_subject(IDENTITY, [0.0, 0.0, 1000.0 + i as f64])]))
        .collect()
}

fn rig_session(mode: AcquisitionMode) -> Arc<StreamSession<SimulatedClient>> {
    Arc::new(StreamSession::new(
        SimulatedClient::from_frames(arm_frames(8)).looping(true),
        options(mode),
    ))
}

#[test]
fn test_background_rig_ticks_and_shuts_down() {
    let session = rig_session(AcquisitionMode::ServerPush);
    let mut scene = Hierarchy::new();
    let root = scene.add_root("ns:Root");
    let upper = scene.add_child(root, "ns:Upper");
    scene.add_child(upper, "ns:Lower");

    let mut rig = LiveRig::new(Arc::clone(&session), RetargetOptions::default(), Duration::from_millis(1));
    rig.add_subject("Arm", Some(root));

    // Not started: nothing happens
    let idle = rig.tick(&mut scene);
    assert!(!idle.connected);
    assert_eq!(idle.report.nodes, 0);

    rig.start().unwrap();
    assert!(rig.is_started());
    assert!(wait_until(|| session.is_connected()));

    let outcome = rig.tick(&mut scene);
    assert!(outcome.connected);
    assert_eq!(outcome.update, None);
    assert_eq!(outcome.report.nodes, 3);
    assert!(outcome.errors.is_empty());
    assert_relative_eq!(scene.world_position(upper).y, 0.3, epsilon = 1e-9);

    rig.shutdown();
    assert!(!rig.is_started());
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(!rig.tick(&mut scene).connected);
}

#[test]
fn test_retimed_rig_updates_on_tick() {
    let mut retimed = options(AcquisitionMode::Retimed);
    retimed.retime_offset = 0.25;
    let session = Arc::new(StreamSession::new(
        SimulatedClient::from_frames(arm_frames(8)).looping(true),
        retimed,
    ));
    let mut scene = Hierarchy::new();
    let root = scene.add_root("ns:Root");

    let mut rig = LiveRig::new(Arc::clone(&session), RetargetOptions::default(), Duration::ZERO);
    rig.add_subject("Arm", Some(root));
    rig.start().unwrap();
    assert!(rig.acquirer().is_some_and(|a| a.is_synchronous()));
    assert!(wait_until(|| session.is_connected()));

    let served = session.with_client(|c| c.frames_served());
    let outcome = rig.tick(&mut scene);
    assert_eq!(outcome.update, Some(QueryStatus::Success));
    assert_eq!(session.with_client(|c| c.frames_served()), served + 1);
    assert_eq!(session.with_client(|c| c.last_update_offset()), Some(0.25));
    assert_eq!(outcome.report.nodes, 1);
    assert_relative_eq!(scene.world_position(root).y, 1.0, epsilon = 1e-9);
}

#[test]
fn test_reconnect_restarts_acquisition() {
    let session = rig_session(AcquisitionMode::ClientPullPreFetch);
    let mut scene = Hierarchy::new();
    let root = scene.add_root("ns:Root");

    let mut rig = LiveRig::new(Arc::clone(&session), RetargetOptions::default(), Duration::from_millis(1));
    rig.add_subject("Arm", Some(root));
    rig.start().unwrap();
    assert!(wait_until(|| session.is_connected()));
    let attempts = session.connect_attempts();

    session.with_client(|c| c.fail_next_connects(2));
    rig.reconnect().unwrap();
    assert!(wait_until(|| session.is_connected()));
    assert_eq!(session.connect_attempts(), attempts + 3);
    assert!(rig.tick(&mut scene).connected);
}

#[test]
fn test_missing_root_reported_as_error() {
    let session = rig_session(AcquisitionMode::ServerPush);
    let mut scene = Hierarchy::new();

    let mut rig: LiveRig<_, mocap_retarget::NodeId> =
        LiveRig::new(Arc::clone(&session), RetargetOptions::default(), Duration::from_millis(1));
    rig.add_subject("Arm", None);
    rig.start().unwrap();
    assert!(wait_until(|| session.is_connected()));

    let outcome = rig.tick(&mut scene);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.report.nodes, 0);
}

#[test]
fn test_rigid_body_written_in_world_space() {
    let session = rig_session(AcquisitionMode::ServerPush);
    let mut scene = Hierarchy::new();
    let stage = scene.add_root("Stage");
    scene.set_local_position(stage, Vec3::new(0.0, 0.0, 4.0));
    let prop = scene.add_child(stage, "Prop");
    scene.record_writes();

    let options = RetargetOptions {
        position_offset: Vec3::new(1.0, 0.0, 0.0),
        ..RetargetOptions::default()
    };
    let mut rig = LiveRig::new(Arc::clone(&session), options, Duration::from_millis(1));
    rig.add_rigid_body("Arm", Some(prop));
    rig.start().unwrap();
    assert!(wait_until(|| session.is_connected()));

    rig.tick(&mut scene);
    rig.shutdown();

    let writes = scene.take_writes();
    assert_eq!(writes[0], (prop, TransformWrite::WorldRotation));
    assert_eq!(writes[1], (prop, TransformWrite::WorldPosition));
    let p = scene.world_position(prop);
    assert_relative_eq!(p.x, 1.0, epsilon = 1e-9);
    assert!(p.y >= 1.0 - 1e-9 && p.y < 1.01);
    assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
}

#[test]
fn test_capture_replay_through_mirrored_rig() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut recorder = BagRecorder::create(file.path()).unwrap();
    for n in 0..20 {
        recorder
            .record(&Timestamped::new(synth::demo_frame(n, 100.0), 1_000 + n as u64 * 10_000))
            .unwrap();
    }
    let info = recorder.finish().unwrap();
    assert_eq!(info.frame_count, 20);
    assert_eq!(BagPlayer::open(file.path()).unwrap().frame_count(), 20);

    let client = SimulatedClient::from_bag(file.path()).unwrap().looping(true);
    let session = Arc::new(StreamSession::new(client, options(AcquisitionMode::ServerPush)));

    let mut scene = Hierarchy::new();
    let rig_root = scene.add_root("Rig");
    let wand = scene.add_root("Wand");

    let mut rig = LiveRig::new(Arc::clone(&session), RetargetOptions::default(), Duration::from_millis(1));
    rig.add_subject("Arm", Some(rig_root));
    rig.add_rigid_body("Wand", Some(wand));
    rig.start().unwrap();
    assert!(wait_until(|| session.is_connected()));

    // Before mirroring nothing matches below the rig root
    let unmatched = rig.tick(&mut scene);
    assert!(unmatched.report.root_unmatched);

    let arm_root = mirror_subject(session.as_ref(), "Arm", &mut scene, rig_root, "Arm").unwrap();
    assert_eq!(scene.name(arm_root), "Arm:Root");
    assert_eq!(scene.child_count(arm_root), 1);
    rig.invalidate_mappings();

    let outcome = rig.tick(&mut scene);
    assert!(!outcome.report.root_unmatched);
    // Root, Upper, Lower, plus the wand
    assert_eq!(outcome.report.nodes, 4);
    assert_relative_eq!(scene.world_position(arm_root).y, 1.2, epsilon = 1e-9);
    assert_relative_eq!(scene.world_position(wand).y, 0.9, epsilon = 1e-9);
    assert_eq!(session.marker_samples("Wand").len(), 3);

    rig.shutdown();
}
