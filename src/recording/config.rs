//! Recording configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    Mic,
    Camcorder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    /// Frames come from a surface the camera renders into.
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Mpeg4,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mpeg4 => "mp4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoEncoder {
    H264,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoder {
    Aac,
}

/// What happens to a session when the recorder cannot be prepared or started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingFailurePolicy {
    /// Fail the whole start attempt.
    #[default]
    Abort,
    /// Drop the recorder and keep the remaining outputs.
    ContinueWithoutRecording,
}

/// Recording section of the service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Record whenever a session starts
    pub enabled: bool,
    /// Video bitrate in bits per second
    pub bitrate: u32,
    /// Frames per second
    pub fps: u32,
    pub audio_source: AudioSource,
    pub output_format: OutputFormat,
    pub video_encoder: VideoEncoder,
    pub audio_encoder: AudioEncoder,
    pub failure_policy: RecordingFailurePolicy,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bitrate: 10_000_000,
            fps: 30,
            audio_source: AudioSource::Mic,
            output_format: OutputFormat::Mpeg4,
            video_encoder: VideoEncoder::H264,
            audio_encoder: AudioEncoder::Aac,
            failure_policy: RecordingFailurePolicy::Abort,
        }
    }
}

/// Everything handed to the host encoder for one recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSettings {
    pub audio_source: AudioSource,
    pub video_source: VideoSource,
    pub output_format: OutputFormat,
    pub output_path: PathBuf,
    pub video_bitrate: u32,
    pub video_frame_rate: u32,
    pub video_size: Size,
    pub video_encoder: VideoEncoder,
    pub audio_encoder: AudioEncoder,
}

impl EncoderSettings {
    pub fn new(config: &RecordingConfig, video_size: Size, output_path: PathBuf) -> Self {
        Self {
            audio_source: config.audio_source,
            video_source: VideoSource::Surface,
            output_format: config.output_format,
            output_path,
            video_bitrate: config.bitrate,
            video_frame_rate: config.fps,
            video_size,
            video_encoder: config.video_encoder,
            audio_encoder: config.audio_encoder,
        }
    }
}

/// `{dir}/{millis}.{ext}`, or the bare file name when there is no
/// external storage.
pub fn output_path(dir: Option<&Path>, unix_millis: i64, format: OutputFormat) -> PathBuf {
    let filename = format!("{}.{}", unix_millis, format.extension());
    match dir {
        Some(dir) => dir.join(filename),
        None => PathBuf::from(filename),
    }
}

/// Output path stamped with the current wall-clock time.
pub fn next_output_path(dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    output_path(dir, chrono::Utc::now().timestamp_millis(), format)
}
