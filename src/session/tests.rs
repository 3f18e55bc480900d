use std::sync::{Arc, Mutex};

use super::*;
use crate::config::ServiceConfig;
use crate::errors::{CameraError, HostError};
use crate::invariant_ppt::{clear_invariant_log, contract_test};
use crate::permissions::{Permission, PermissionStatus};
use crate::recording::RecordingFailurePolicy;
use crate::testing::{HostOp, SimController, SimulatedCameraHost};
use crate::types::{
    CaptureRequest, CaptureTemplate, DeviceCharacteristics, DeviceId, Facing, FrameInfo,
    ImageFormat, Size, SurfaceId,
};

fn background() -> SessionRequest {
    SessionRequest::background(Size::new(320, 200))
}

fn setup_with(
    host: SimulatedCameraHost,
    config: ServiceConfig,
) -> (Lifecycle<SimulatedCameraHost>, HostEventReceiver, SimController) {
    let sim = host.controller();
    let (lifecycle, events) = Lifecycle::new(host, config);
    (lifecycle, events, sim)
}

fn setup() -> (Lifecycle<SimulatedCameraHost>, HostEventReceiver, SimController) {
    setup_with(SimulatedCameraHost::new(), ServiceConfig::default())
}

fn transitions(events: &[LifecycleEvent]) -> Vec<(SessionState, SessionState)> {
    events
        .iter()
        .filter_map(|e| match e {
            LifecycleEvent::Transition(t) => Some((t.from, t.to)),
            _ => None,
        })
        .collect()
}

fn position(journal: &[HostOp], wanted: impl Fn(&HostOp) -> bool) -> usize {
    journal
        .iter()
        .position(wanted)
        .unwrap_or_else(|| panic!("operation not found in {:?}", journal))
}

#[test]
fn test_background_start_reaches_active() {
    let (mut lifecycle, mut events, sim) = setup();

    lifecycle.start(background()).unwrap();
    assert_eq!(lifecycle.state(), SessionState::Opening);
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Active);
    assert_eq!(lifecycle.generation(), 1);
    assert_eq!(lifecycle.bundle().capture_size(), Some(Size::new(1280, 720)));

    let reader = SurfaceId(1);
    assert_eq!(
        sim.journal(),
        vec![
            HostOp::OpenRequested(DeviceId::new("1")),
            HostOp::ImageReaderCreated {
                surface: reader,
                size: Size::new(1280, 720),
                format: ImageFormat::Yuv420_888,
                max_images: 2,
            },
            HostOp::SessionRequested(vec![reader]),
            HostOp::RepeatingRequest(CaptureRequest::new(CaptureTemplate::Preview, vec![reader])),
        ]
    );
    assert_eq!(
        transitions(&lifecycle.take_events()),
        vec![
            (SessionState::Idle, SessionState::Opening),
            (SessionState::Opening, SessionState::Configuring),
            (SessionState::Configuring, SessionState::Active),
        ]
    );
}

#[test]
fn test_preview_start_uses_preview_surface() {
    let (mut lifecycle, mut events, sim) = setup();

    lifecycle
        .start(SessionRequest::with_preview(Size::new(1280, 720)))
        .unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Active);
    let journal = sim.journal();
    assert!(journal.contains(&HostOp::PreviewSurfaceCreated(
        SurfaceId(1),
        Size::new(1280, 720)
    )));
    assert!(journal.contains(&HostOp::SessionRequested(vec![SurfaceId(1), SurfaceId(2)])));
}

#[test]
fn test_stop_is_idempotent_from_idle() {
    let (mut lifecycle, _events, sim) = setup();

    lifecycle.stop();
    lifecycle.stop();

    assert_eq!(lifecycle.state(), SessionState::Idle);
    assert!(lifecycle.take_events().is_empty());
    assert!(sim.journal().is_empty());
}

#[test]
fn test_stop_releases_in_order() {
    let (mut lifecycle, mut events, sim) = setup();
    lifecycle
        .start(SessionRequest::with_preview(Size::new(640, 480)))
        .unwrap();
    lifecycle.pump(&mut events);
    sim.clear_journal();

    lifecycle.stop();

    assert_eq!(lifecycle.state(), SessionState::Idle);
    assert_eq!(
        sim.journal(),
        vec![
            HostOp::SessionClosed,
            HostOp::DeviceClosed(DeviceId::new("1")),
            HostOp::SurfaceReleased(SurfaceId(1)),
            HostOp::SurfaceReleased(SurfaceId(2)),
        ]
    );
    assert_eq!(sim.live_handles(), 0);
    assert_eq!(lifecycle.bundle().live_handles(), 0);
}

#[test]
fn test_restart_while_active_tears_down_first() {
    let (mut lifecycle, mut events, sim) = setup();
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    lifecycle.take_events();
    sim.clear_journal();

    lifecycle.start(background()).unwrap();

    let observed = transitions(&lifecycle.take_events());
    assert_eq!(
        &observed[..3],
        &[
            (SessionState::Active, SessionState::Stopping),
            (SessionState::Stopping, SessionState::Idle),
            (SessionState::Idle, SessionState::Opening),
        ]
    );

    let journal = sim.journal();
    let released = position(&journal, |op| *op == HostOp::SurfaceReleased(SurfaceId(1)));
    let reopened = position(&journal, |op| matches!(op, HostOp::OpenRequested(_)));
    assert!(released < reopened);

    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Active);
    assert_eq!(lifecycle.generation(), 2);
    assert_eq!(sim.open_devices(), 1);
}

#[test]
fn test_stop_while_opening_closes_late_device() {
    let (mut lifecycle, mut events, sim) =
        setup_with(SimulatedCameraHost::new().manual(), ServiceConfig::default());

    lifecycle.start(background()).unwrap();
    assert_eq!(lifecycle.state(), SessionState::Opening);
    lifecycle.stop();
    assert_eq!(lifecycle.state(), SessionState::Idle);

    assert!(sim.complete_open());
    assert_eq!(lifecycle.pump(&mut events), 1);

    assert_eq!(lifecycle.state(), SessionState::Idle);
    assert!(sim
        .journal()
        .contains(&HostOp::DeviceClosed(DeviceId::new("1"))));
    assert_eq!(sim.live_handles(), 0);
    assert!(!transitions(&lifecycle.take_events())
        .iter()
        .any(|(_, to)| *to == SessionState::Active));
}

#[test]
fn test_open_from_superseded_start_is_closed() {
    let (mut lifecycle, mut events, sim) =
        setup_with(SimulatedCameraHost::new().manual(), ServiceConfig::default());

    lifecycle.start(background()).unwrap();
    lifecycle.start(background()).unwrap();
    assert_eq!(sim.pending_opens(), 2);

    // First pending open belongs to the superseded attempt.
    sim.complete_open();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Opening);
    assert_eq!(sim.open_devices(), 0);

    sim.complete_open();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Configuring);

    sim.complete_configure();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Active);
    assert_eq!(sim.open_devices(), 1);
}

#[test]
fn test_late_configuration_is_closed() {
    let (mut lifecycle, mut events, sim) =
        setup_with(SimulatedCameraHost::new().manual(), ServiceConfig::default());

    lifecycle.start(background()).unwrap();
    sim.complete_open();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Configuring);

    lifecycle.stop();
    sim.complete_configure();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Idle);
    assert!(sim.journal().contains(&HostOp::SessionClosed));
    assert_eq!(sim.live_handles(), 0);
}

#[test]
fn test_open_call_failure_leaves_no_handles() {
    let (mut lifecycle, mut events, sim) = setup();
    sim.fail_next_open_call(HostError::Access("camera disabled by policy".into()));

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert!(matches!(
        lifecycle.last_error(),
        Some(CameraError::DeviceUnavailable(_))
    ));
    assert_eq!(sim.live_handles(), 0);
    assert_eq!(lifecycle.bundle().live_handles(), 0);
}

#[test]
fn test_async_open_error_fails_session() {
    let (mut lifecycle, mut events, sim) = setup();
    sim.fail_next_open_async(4);

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert_eq!(sim.live_handles(), 0);
    let failed = lifecycle
        .take_events()
        .into_iter()
        .any(|e| matches!(e, LifecycleEvent::Failed { ref kind, .. } if kind == "device_unavailable"));
    assert!(failed);
}

#[test]
fn test_camera_permission_denied() {
    let host =
        SimulatedCameraHost::new().with_permission(Permission::Camera, PermissionStatus::Denied);
    let (mut lifecycle, mut events, sim) = setup_with(host, ServiceConfig::default());

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert_eq!(
        lifecycle.last_error(),
        Some(&CameraError::PermissionDenied(vec![Permission::Camera]))
    );
    let journal = sim.journal();
    assert_eq!(
        journal,
        vec![HostOp::PermissionsRequested(vec![Permission::Camera])]
    );
    assert!(lifecycle
        .take_events()
        .contains(&LifecycleEvent::PermissionsRequested {
            permissions: vec![Permission::Camera]
        }));
}

#[test]
fn test_recording_needs_microphone_permission() {
    let host = SimulatedCameraHost::new()
        .with_permission(Permission::RecordAudio, PermissionStatus::NotDetermined);
    let (mut lifecycle, mut events, _sim) = setup_with(host, ServiceConfig::default());

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Active);

    lifecycle.start(background().with_recording(true)).unwrap();
    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert_eq!(
        lifecycle.last_error(),
        Some(&CameraError::PermissionDenied(vec![Permission::RecordAudio]))
    );
}

#[test]
fn test_missing_front_camera_fails() {
    let host = SimulatedCameraHost::new().with_devices(vec![(
        DeviceId::new("0"),
        DeviceCharacteristics {
            facing: Facing::Back,
            output_sizes: vec![Size::new(1920, 1080)],
        },
    )]);
    let (mut lifecycle, _events, sim) = setup_with(host, ServiceConfig::default());

    lifecycle.start(background()).unwrap();

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert!(matches!(
        lifecycle.last_error(),
        Some(CameraError::DeviceUnavailable(_))
    ));
    assert!(sim.journal().is_empty());
}

#[test]
fn test_configured_facing_is_honored() {
    let mut config = ServiceConfig::default();
    config.camera.facing = Facing::Back;
    let (mut lifecycle, mut events, sim) = setup_with(SimulatedCameraHost::new(), config);

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(sim.journal()[0], HostOp::OpenRequested(DeviceId::new("0")));
}

#[test]
fn test_recording_session_starts_encoder_and_record_template() {
    let (mut lifecycle, mut events, sim) = setup();

    lifecycle.start(background().with_recording(true)).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Active);
    assert!(lifecycle.bundle().is_recording());

    let path = lifecycle.bundle().recording_path().unwrap().to_path_buf();
    assert!(path.starts_with("/storage/emulated/0/Android/data/files"));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp4"));

    // reader = 1, encoder input = 2, preview feed = 3
    let journal = sim.journal();
    assert!(journal.contains(&HostOp::SessionRequested(vec![
        SurfaceId(3),
        SurfaceId(1),
        SurfaceId(2)
    ])));
    let started = position(&journal, |op| *op == HostOp::EncoderStarted);
    let repeating = position(&journal, |op| {
        matches!(op, HostOp::RepeatingRequest(r) if r.template == CaptureTemplate::Record)
    });
    assert!(started < repeating);

    let settings = journal
        .iter()
        .find_map(|op| match op {
            HostOp::EncoderConfigured(settings) => Some(settings.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(settings.video_size, Size::new(1280, 720));
    assert_eq!(settings.video_bitrate, 10_000_000);
    assert_eq!(settings.video_frame_rate, 30);

    assert!(lifecycle
        .take_events()
        .contains(&LifecycleEvent::RecordingStarted { path }));
}

#[test]
fn test_recording_with_preview_reuses_preview_surface() {
    let (mut lifecycle, mut events, sim) = setup();

    lifecycle
        .start(SessionRequest::with_preview(Size::new(1280, 720)).with_recording(true))
        .unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Active);
    let previews = sim
        .journal()
        .iter()
        .filter(|op| matches!(op, HostOp::PreviewSurfaceCreated(..)))
        .count();
    assert_eq!(previews, 1);
}

#[test]
fn test_stop_finalizes_recording() {
    let (mut lifecycle, mut events, sim) = setup();
    lifecycle.start(background().with_recording(true)).unwrap();
    lifecycle.pump(&mut events);
    sim.clear_journal();

    lifecycle.stop();

    let journal = sim.journal();
    let device_closed = position(&journal, |op| matches!(op, HostOp::DeviceClosed(_)));
    let stopped = position(&journal, |op| *op == HostOp::EncoderStopped);
    let released = position(&journal, |op| *op == HostOp::EncoderReleased);
    assert!(device_closed < stopped);
    assert!(stopped < released);
    assert_eq!(sim.live_handles(), 0);
}

#[test]
fn test_encoder_failure_aborts_by_default() {
    let (mut lifecycle, mut events, sim) = setup();
    sim.set_fail_encoder_prepare(true);

    lifecycle.start(background().with_recording(true)).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert!(matches!(
        lifecycle.last_error(),
        Some(CameraError::EncoderPrepareFailure(_))
    ));
    assert_eq!(sim.live_handles(), 0);
}

#[test]
fn test_encoder_failure_can_continue_without_recording() {
    let mut config = ServiceConfig::default();
    config.recording.failure_policy = RecordingFailurePolicy::ContinueWithoutRecording;
    let (mut lifecycle, mut events, sim) = setup_with(SimulatedCameraHost::new(), config);
    sim.set_fail_encoder_prepare(true);

    lifecycle.start(background().with_recording(true)).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Active);
    assert!(!lifecycle.bundle().is_recording());
    assert!(sim.journal().contains(&HostOp::RepeatingRequest(CaptureRequest::new(
        CaptureTemplate::Preview,
        vec![SurfaceId(1)]
    ))));
}

#[test]
fn test_encoder_start_failure_can_continue() {
    let mut config = ServiceConfig::default();
    config.recording.failure_policy = RecordingFailurePolicy::ContinueWithoutRecording;
    let (mut lifecycle, mut events, sim) = setup_with(SimulatedCameraHost::new(), config);
    sim.set_fail_encoder_start(true);

    lifecycle.start(background().with_recording(true)).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Active);
    assert!(!lifecycle.bundle().is_recording());
    assert!(sim.journal().contains(&HostOp::EncoderReleased));
}

#[test]
fn test_configure_failure_releases_everything() {
    let (mut lifecycle, mut events, sim) = setup();
    sim.set_fail_configure(true);

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert_eq!(sim.live_handles(), 0);
}

#[test]
fn test_rejected_repeating_request_fails() {
    let (mut lifecycle, mut events, sim) = setup();
    sim.set_fail_repeating_request(true);

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert!(matches!(
        lifecycle.last_error(),
        Some(CameraError::CaptureFailed(_))
    ));
    assert_eq!(sim.live_handles(), 0);
}

#[test]
fn test_disconnect_while_active() {
    let (mut lifecycle, mut events, sim) = setup();
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    sim.clear_journal();

    sim.disconnect();
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert!(matches!(
        lifecycle.last_error(),
        Some(CameraError::Disconnected(_))
    ));
    // The device dropped the session, so only the device is closed.
    assert!(!sim.journal().contains(&HostOp::SessionClosed));
    assert_eq!(sim.live_handles(), 0);
}

fn failure_kind(lifecycle: &mut Lifecycle<SimulatedCameraHost>) -> Option<String> {
    lifecycle.take_events().into_iter().find_map(|e| match e {
        LifecycleEvent::Failed { kind, .. } => Some(kind),
        _ => None,
    })
}

#[test]
fn test_device_error_while_active() {
    let (mut lifecycle, mut events, sim) = setup();
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    lifecycle.take_events();
    sim.clear_journal();

    assert!(sim.device_error(3));
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    match lifecycle.last_error() {
        Some(CameraError::DeviceUnavailable(message)) => {
            assert!(message.contains("camera 1 reported error 3"), "{message}")
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(failure_kind(&mut lifecycle).as_deref(), Some("device_unavailable"));
    let journal = sim.journal();
    assert!(!journal.contains(&HostOp::SessionClosed));
    assert!(journal.contains(&HostOp::DeviceClosed(DeviceId::new("1"))));
    assert_eq!(sim.live_handles(), 0);
    assert_eq!(lifecycle.bundle().live_handles(), 0);
}

#[test]
fn test_device_error_while_opening() {
    let (mut lifecycle, mut events, sim) =
        setup_with(SimulatedCameraHost::new().manual(), ServiceConfig::default());
    lifecycle.start(background()).unwrap();
    assert_eq!(lifecycle.state(), SessionState::Opening);

    assert!(sim.reject_open(5));
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert!(matches!(
        lifecycle.last_error(),
        Some(CameraError::DeviceUnavailable(_))
    ));
    assert_eq!(failure_kind(&mut lifecycle).as_deref(), Some("device_unavailable"));
    assert_eq!(sim.live_handles(), 0);
    assert_eq!(lifecycle.bundle().live_handles(), 0);
}

#[test]
fn test_disconnect_while_opening() {
    let (mut lifecycle, mut events, sim) =
        setup_with(SimulatedCameraHost::new().manual(), ServiceConfig::default());
    lifecycle.start(background()).unwrap();

    assert!(sim.disconnect_pending());
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    match lifecycle.last_error() {
        Some(CameraError::DeviceUnavailable(message)) => {
            assert!(message.contains("disconnected while opening"), "{message}")
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(failure_kind(&mut lifecycle).as_deref(), Some("device_unavailable"));
    assert_eq!(sim.live_handles(), 0);
    assert_eq!(lifecycle.bundle().live_handles(), 0);
}

#[test]
fn test_disconnect_while_configuring() {
    let (mut lifecycle, mut events, sim) =
        setup_with(SimulatedCameraHost::new().manual(), ServiceConfig::default());
    lifecycle.start(background()).unwrap();
    sim.complete_open();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Configuring);

    assert!(sim.disconnect());
    lifecycle.pump(&mut events);

    assert_eq!(lifecycle.state(), SessionState::Failed);
    match lifecycle.last_error() {
        Some(CameraError::DeviceUnavailable(message)) => {
            assert!(message.contains("camera 1 disconnected while configuring"), "{message}")
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(failure_kind(&mut lifecycle).as_deref(), Some("device_unavailable"));
    assert!(sim
        .journal()
        .contains(&HostOp::DeviceClosed(DeviceId::new("1"))));
    assert_eq!(sim.live_handles(), 0);

    // The configure that was still in flight arrives too late.
    assert!(sim.complete_configure());
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Failed);
    assert_eq!(sim.live_handles(), 0);
}

#[test]
fn test_stale_disconnect_is_ignored() {
    let (mut lifecycle, mut events, sim) = setup();
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);

    // Reported through the first attempt's callback.
    assert!(sim.device_error_at(Some(0), 1));
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Active);
}

#[test]
fn test_failed_state_recovery() {
    let (mut lifecycle, mut events, sim) = setup();
    sim.fail_next_open_async(2);
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Failed);

    lifecycle.stop();
    assert_eq!(lifecycle.state(), SessionState::Idle);

    sim.fail_next_open_async(2);
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Failed);

    // Starting from Failed acknowledges implicitly.
    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    assert_eq!(lifecycle.state(), SessionState::Active);
}

#[test]
fn test_invalid_request_changes_nothing() {
    let (mut lifecycle, _events, sim) = setup();
    let request = SessionRequest::background(Size::new(320, 200)).with_frame_sink(false);

    let result = lifecycle.start(request);

    assert!(matches!(result, Err(CameraError::InvalidRequest(_))));
    assert_eq!(lifecycle.state(), SessionState::Idle);
    assert_eq!(lifecycle.generation(), 0);
    assert!(sim.journal().is_empty());
}

#[test]
fn test_frames_reach_callback() {
    let (mut lifecycle, mut events, sim) = setup();
    let seen: Arc<Mutex<Vec<FrameInfo>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    lifecycle.set_frame_callback(Some(Arc::new(move |info: FrameInfo| {
        sink.lock().unwrap().push(info);
    })));

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    assert_eq!(sim.emit_frame(1280, 720, 1_000), 1);
    assert_eq!(sim.emit_frame(1280, 720, 2_000), 1);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].sequence, 2);
    assert_eq!(seen[1].timestamp_ns, 2_000);
    assert_eq!(lifecycle.frames().delivered(), 2);

    lifecycle.stop();
    assert_eq!(sim.emit_frame(1280, 720, 3_000), 0);
}

#[test]
fn test_dropping_lifecycle_releases_handles() {
    let (mut lifecycle, mut events, sim) = setup();
    lifecycle.start(background().with_recording(true)).unwrap();
    lifecycle.pump(&mut events);
    assert!(sim.live_handles() > 0);

    drop(lifecycle);

    assert_eq!(sim.live_handles(), 0);
}

#[test]
fn test_lifecycle_contracts() {
    clear_invariant_log();
    let (mut lifecycle, mut events, _sim) = setup();

    lifecycle.start(background()).unwrap();
    lifecycle.pump(&mut events);
    lifecycle.stop();

    contract_test(
        "capture lifecycle",
        &[
            "Lifecycle transitions follow the state table",
            "Configured session has at least one sink",
        ],
    );
}
