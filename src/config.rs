//! Configuration management for the background camera service
//!
//! Loads and saves the service settings as TOML: which camera to use and how
//! to pick its resolution, the frame sink, recording parameters and the
//! foreground notification shown while the service runs.

use crate::errors::CameraError;
use crate::recording::RecordingConfig;
use crate::selector::AspectPolicy;
use crate::types::{Facing, ImageFormat, Size};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub camera: CameraConfig,
    pub frame_sink: FrameSinkConfig,
    pub recording: RecordingConfig,
    pub notification: NotificationConfig,
}

/// Camera selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Which lens to open
    pub facing: Facing,
    /// How the target aspect ratio is compared with device sizes
    pub aspect_policy: AspectPolicy,
    /// Viewport [width, height] used when starting without preview
    pub background_viewport: [u32; 2],
}

impl CameraConfig {
    pub fn background_viewport(&self) -> Size {
        Size::new(self.background_viewport[0], self.background_viewport[1])
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Front,
            aspect_policy: AspectPolicy::Normalized,
            background_viewport: [320, 200],
        }
    }
}

/// Frame-processing sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSinkConfig {
    pub enabled: bool,
    pub format: ImageFormat,
    /// Images the reader may hold at once
    pub max_images: u32,
}

impl Default for FrameSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: ImageFormat::Yuv420_888,
            max_images: 2,
        }
    }
}

/// Foreground notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Title, text and ticker of the notification
    pub app_name: String,
    pub channel_id: String,
    pub channel_name: String,
    pub notification_id: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            app_name: "Background Camera".to_string(),
            channel_id: "cam_service_channel_id".to_string(),
            channel_name: "cam_service_channel_name".to_string(),
            notification_id: 6660,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ServiceConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CameraError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CameraError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)
            .map_err(|e| CameraError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if !self.camera.background_viewport().is_valid() {
            return Err(CameraError::Config(format!(
                "background_viewport must be positive, got {}",
                self.camera.background_viewport()
            )));
        }

        if self.frame_sink.max_images == 0 {
            return Err(CameraError::Config(
                "frame_sink.max_images must be at least 1".to_string(),
            ));
        }

        if self.recording.bitrate == 0 {
            return Err(CameraError::Config(
                "recording.bitrate must be positive".to_string(),
            ));
        }

        if self.recording.fps == 0 || self.recording.fps > 240 {
            return Err(CameraError::Config(format!(
                "recording.fps must be in 1..=240, got {}",
                self.recording.fps
            )));
        }

        if self.notification.channel_id.is_empty() {
            return Err(CameraError::Config(
                "notification.channel_id must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
