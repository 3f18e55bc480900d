//! Tests for the recording module

#[cfg(test)]
mod recording_tests {
    use crate::errors::HostError;
    use crate::platform::EncoderSink;
    use crate::recording::{
        output_path, EncoderSettings, OutputFormat, RecorderSink, RecordingConfig, VideoEncoder,
    };
    use crate::types::{Size, SurfaceId};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls(Vec<&'static str>);

    struct ScriptedEncoder {
        calls: Arc<Mutex<Calls>>,
        fail_prepare: bool,
        prepared: bool,
    }

    impl ScriptedEncoder {
        fn new(calls: Arc<Mutex<Calls>>, fail_prepare: bool) -> Box<Self> {
            Box::new(Self {
                calls,
                fail_prepare,
                prepared: false,
            })
        }

        fn log(&self, call: &'static str) {
            self.calls.lock().unwrap().0.push(call);
        }
    }

    impl EncoderSink for ScriptedEncoder {
        fn configure(&mut self, _settings: &EncoderSettings) -> Result<(), HostError> {
            self.log("configure");
            Ok(())
        }

        fn prepare(&mut self) -> Result<(), HostError> {
            self.log("prepare");
            if self.fail_prepare {
                return Err(HostError::Io("cannot create output file".into()));
            }
            self.prepared = true;
            Ok(())
        }

        fn input_surface(&self) -> Option<SurfaceId> {
            self.prepared.then_some(SurfaceId(42))
        }

        fn start(&mut self) -> Result<(), HostError> {
            self.log("start");
            Ok(())
        }

        fn stop(&mut self) -> Result<(), HostError> {
            self.log("stop");
            Ok(())
        }

        fn reset(&mut self) {
            self.log("reset");
        }

        fn release(&mut self) {
            self.log("release");
        }
    }

    fn settings() -> EncoderSettings {
        EncoderSettings::new(
            &RecordingConfig::default(),
            Size::new(1280, 720),
            PathBuf::from("/sdcard/1.mp4"),
        )
    }

    #[test]
    fn test_default_recording_config() {
        let config = RecordingConfig::default();
        assert_eq!(config.bitrate, 10_000_000);
        assert_eq!(config.fps, 30);
        assert_eq!(config.video_encoder, VideoEncoder::H264);
        assert!(!config.enabled);
    }

    #[test]
    fn test_output_path_with_and_without_storage() {
        let with_dir = output_path(Some(Path::new("/storage/app")), 1234, OutputFormat::Mpeg4);
        assert_eq!(with_dir, PathBuf::from("/storage/app/1234.mp4"));

        let bare = output_path(None, 1234, OutputFormat::Mpeg4);
        assert_eq!(bare, PathBuf::from("1234.mp4"));
    }

    #[test]
    fn test_prepare_start_release_sequence() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut recorder = RecorderSink::prepare(ScriptedEncoder::new(calls.clone(), false), settings())
            .expect("prepare should succeed");
        assert_eq!(recorder.surface(), SurfaceId(42));

        recorder.start().unwrap();
        assert!(recorder.is_recording());
        recorder.release();

        assert_eq!(
            calls.lock().unwrap().0,
            vec!["configure", "prepare", "start", "stop", "reset", "release"]
        );
    }

    #[test]
    fn test_unstarted_recorder_is_not_stopped() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let recorder =
            RecorderSink::prepare(ScriptedEncoder::new(calls.clone(), false), settings()).unwrap();
        recorder.release();
        assert_eq!(
            calls.lock().unwrap().0,
            vec!["configure", "prepare", "reset", "release"]
        );
    }

    #[test]
    fn test_prepare_failure_releases_encoder() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let result = RecorderSink::prepare(ScriptedEncoder::new(calls.clone(), true), settings());
        let err = result.err().expect("prepare should fail");
        assert_eq!(err.kind(), "encoder_prepare_failure");
        assert_eq!(
            calls.lock().unwrap().0,
            vec!["configure", "prepare", "reset", "release"]
        );
    }
}
