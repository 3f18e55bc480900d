use backgroundcam::config::ServiceConfig;
use backgroundcam::recording::RecordingFailurePolicy;
use backgroundcam::selector::AspectPolicy;
use backgroundcam::types::{Facing, Size};
use backgroundcam::CameraError;
use tempfile::tempdir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let config = ServiceConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.camera.facing, Facing::Front);
    assert_eq!(config.camera.background_viewport(), Size::new(320, 200));
    assert!(!config.recording.enabled);
}

#[test]
fn test_save_then_load_keeps_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("backgroundcam.toml");

    let mut config = ServiceConfig::default();
    config.camera.aspect_policy = AspectPolicy::Unnormalized;
    config.camera.background_viewport = [640, 360];
    config.recording.enabled = true;
    config.recording.fps = 24;
    config.recording.failure_policy = RecordingFailurePolicy::ContinueWithoutRecording;
    config.notification.app_name = "Dashcam".to_string();
    config.save_to_file(&path).unwrap();

    let loaded = ServiceConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded.camera.aspect_policy, AspectPolicy::Unnormalized);
    assert_eq!(loaded.camera.background_viewport(), Size::new(640, 360));
    assert!(loaded.recording.enabled);
    assert_eq!(loaded.recording.fps, 24);
    assert_eq!(
        loaded.recording.failure_policy,
        RecordingFailurePolicy::ContinueWithoutRecording
    );
    assert_eq!(loaded.notification.app_name, "Dashcam");
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[camera]\nbackground_viewport = [0, 200]\n").unwrap();

    let result = ServiceConfig::load_from_file(&path);
    assert!(matches!(result, Err(CameraError::Config(_))));
}

#[test]
fn test_unparsable_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let err = ServiceConfig::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
