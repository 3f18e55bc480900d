use serde::{Deserialize, Serialize};

use crate::errors::CameraError;
use crate::types::Size;

/// Outputs wanted for one start command. Immutable once the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub wants_preview: bool,
    pub wants_frame_sink: bool,
    pub wants_recording: bool,
    /// Target size for resolution selection.
    pub viewport: Size,
}

impl SessionRequest {
    /// Frame processing only, no preview.
    pub fn background(viewport: Size) -> Self {
        Self {
            wants_preview: false,
            wants_frame_sink: true,
            wants_recording: false,
            viewport,
        }
    }

    /// Overlay preview plus frame processing.
    pub fn with_preview(viewport: Size) -> Self {
        Self {
            wants_preview: true,
            wants_frame_sink: true,
            wants_recording: false,
            viewport,
        }
    }

    pub fn with_frame_sink(mut self, enabled: bool) -> Self {
        self.wants_frame_sink = enabled;
        self
    }

    pub fn with_recording(mut self, enabled: bool) -> Self {
        self.wants_recording = enabled;
        self
    }

    pub fn has_outputs(&self) -> bool {
        self.wants_preview || self.wants_frame_sink || self.wants_recording
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if !self.has_outputs() {
            return Err(CameraError::InvalidRequest(
                "request asks for no outputs".to_string(),
            ));
        }
        if !self.viewport.is_valid() {
            return Err(CameraError::InvalidRequest(format!(
                "viewport must be positive, got {}",
                self.viewport
            )));
        }
        Ok(())
    }
}
