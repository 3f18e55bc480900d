use thiserror::Error;

use crate::permissions::Permission;

/// Failure reported by a host API call (camera access, file I/O, illegal state).
///
/// Host implementations convert whatever their platform throws into one of
/// these before it reaches the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("camera access error: {0}")]
    Access(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::Io(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("Permission denied: {}", format_permissions(.0))]
    PermissionDenied(Vec<Permission>),
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Encoder prepare failure: {0}")]
    EncoderPrepareFailure(String),
    #[error("Device disconnected: {0}")]
    Disconnected(String),
    #[error("Capture error: {0}")]
    CaptureFailed(String),
    #[error("Invalid session request: {0}")]
    InvalidRequest(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Camera service is not running")]
    ServiceUnavailable,
}

impl CameraError {
    /// Short machine-readable tag, used in serialized service events.
    pub fn kind(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied(_) => "permission_denied",
            CameraError::DeviceUnavailable(_) => "device_unavailable",
            CameraError::EncoderPrepareFailure(_) => "encoder_prepare_failure",
            CameraError::Disconnected(_) => "disconnected",
            CameraError::CaptureFailed(_) => "capture_failed",
            CameraError::InvalidRequest(_) => "invalid_request",
            CameraError::Config(_) => "config",
            CameraError::ServiceUnavailable => "service_unavailable",
        }
    }

    pub(crate) fn device(context: &str, err: HostError) -> Self {
        CameraError::DeviceUnavailable(format!("{context}: {err}"))
    }

    pub(crate) fn encoder(context: &str, err: HostError) -> Self {
        CameraError::EncoderPrepareFailure(format!("{context}: {err}"))
    }
}

fn format_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
