use std::path::Path;

use crate::errors::CameraError;
use crate::platform::EncoderSink;
use crate::recording::EncoderSettings;
use crate::types::SurfaceId;

/// A prepared host encoder bound into a capture session.
pub struct RecorderSink {
    encoder: Box<dyn EncoderSink>,
    settings: EncoderSettings,
    input_surface: SurfaceId,
    recording: bool,
}

impl RecorderSink {
    /// Configure and prepare `encoder`. On failure the encoder is reset and
    /// released before the error is returned.
    pub fn prepare(
        mut encoder: Box<dyn EncoderSink>,
        settings: EncoderSettings,
    ) -> Result<Self, CameraError> {
        let prepared = encoder
            .configure(&settings)
            .and_then(|_| encoder.prepare())
            .map_err(|e| CameraError::encoder("prepare recorder", e))
            .and_then(|_| {
                encoder.input_surface().ok_or_else(|| {
                    CameraError::EncoderPrepareFailure(
                        "encoder exposed no input surface after prepare".to_string(),
                    )
                })
            });

        match prepared {
            Ok(input_surface) => {
                log::info!(
                    "Recorder prepared: {} {}@{}fps {}bps -> {}",
                    input_surface,
                    settings.video_size,
                    settings.video_frame_rate,
                    settings.video_bitrate,
                    settings.output_path.display()
                );
                Ok(Self {
                    encoder,
                    settings,
                    input_surface,
                    recording: false,
                })
            }
            Err(e) => {
                encoder.reset();
                encoder.release();
                Err(e)
            }
        }
    }

    pub fn surface(&self) -> SurfaceId {
        self.input_surface
    }

    pub fn output_path(&self) -> &Path {
        &self.settings.output_path
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.recording {
            return Ok(());
        }
        self.encoder
            .start()
            .map_err(|e| CameraError::encoder("start recorder", e))?;
        self.recording = true;
        log::info!("Recording to {}", self.settings.output_path.display());
        Ok(())
    }

    /// Stop (when started), reset and release the encoder.
    pub fn release(mut self) {
        if self.recording {
            if let Err(e) = self.encoder.stop() {
                log::warn!("Error stopping recorder: {}", e);
            }
            self.recording = false;
        }
        self.encoder.reset();
        self.encoder.release();
    }
}
