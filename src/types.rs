use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CameraError;

/// Width/height pair of a capture resolution or a target viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build a size, rejecting zero dimensions.
    pub fn try_new(width: u32, height: u32) -> Result<Self, CameraError> {
        let size = Self::new(width, height);
        if !size.is_valid() {
            return Err(CameraError::InvalidRequest(format!(
                "size must have positive dimensions, got {size}"
            )));
        }
        Ok(size)
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Short side over long side, always in `(0, 1]` for a valid size.
    pub fn normalized_aspect(&self) -> f64 {
        let (short, long) = if self.width < self.height {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        f64::from(short) / f64::from(long)
    }

    /// Width over height, orientation preserved.
    pub fn raw_aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| CameraError::InvalidRequest(format!("expected WxH, got '{s}'")))?;
        let width = w
            .parse::<u32>()
            .map_err(|e| CameraError::InvalidRequest(format!("bad width '{w}': {e}")))?;
        let height = h
            .parse::<u32>()
            .map_err(|e| CameraError::InvalidRequest(format!("bad height '{h}': {e}")))?;
        Size::try_new(width, height)
    }
}

/// Opaque camera identity as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical orientation label reported for a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Front,
    Back,
    External,
}

/// What the host reports for one device identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCharacteristics {
    pub facing: Facing,
    /// Sizes the device can stream to a preview/texture surface.
    pub output_sizes: Vec<Size>,
}

/// Opaque identifier for a host surface that can be a capture target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Pixel layout of frames delivered to the frame sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    /// Planar YUV 4:2:0, the flexible camera format.
    Yuv420_888,
    Jpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureTemplate {
    Preview,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfMode {
    Off,
    ContinuousVideo,
    ContinuousPicture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AeMode {
    Off,
    On,
    OnAutoFlash,
}

/// Repeating capture command issued once the session is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub template: CaptureTemplate,
    pub targets: Vec<SurfaceId>,
    pub af_mode: AfMode,
    pub ae_mode: AeMode,
}

impl CaptureRequest {
    /// Continuous-picture autofocus and auto-flash exposure for every target.
    pub fn new(template: CaptureTemplate, targets: Vec<SurfaceId>) -> Self {
        Self {
            template,
            targets,
            af_mode: AfMode::ContinuousPicture,
            ae_mode: AeMode::OnAutoFlash,
        }
    }
}

/// What a frame callback gets to see of a captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub timestamp_ns: i64,
}
