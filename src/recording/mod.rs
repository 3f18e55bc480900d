//! Recording sink configuration
//!
//! Encoding itself belongs to the host media recorder. This module decides
//! what to ask of it:
//! - H.264 video from a camera surface, AAC audio from the microphone
//! - MPEG-4 container at `{external_dir}/{unix_millis}.mp4`
//! - 10 Mbps at 30 fps by default
//!
//! # Example
//! ```rust
//! use backgroundcam::recording::{output_path, EncoderSettings, OutputFormat, RecordingConfig};
//! use backgroundcam::types::Size;
//!
//! let config = RecordingConfig::default();
//! let path = output_path(None, 1_700_000_000_000, OutputFormat::Mpeg4);
//! let settings = EncoderSettings::new(&config, Size::new(1280, 720), path);
//! assert_eq!(settings.output_path.to_str(), Some("1700000000000.mp4"));
//! ```

mod config;
mod recorder;

pub use config::{
    next_output_path, output_path, AudioEncoder, AudioSource, EncoderSettings, OutputFormat,
    RecordingConfig, RecordingFailurePolicy, VideoEncoder, VideoSource,
};
pub use recorder::RecorderSink;

#[cfg(test)]
mod tests;
