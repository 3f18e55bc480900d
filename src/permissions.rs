//! Runtime permissions the camera service depends on.
//!
//! The host's permission authority answers `check_permission`; this module
//! only decides which permissions a request needs and how results map to
//! user-facing notices.

use crate::session::SessionRequest;

/// Request code used when the service asks the host for missing permissions.
pub const PERMISSIONS_REQUEST_CODE: u32 = 123;

/// A capability the host must grant before the camera can be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Camera,
    RecordAudio,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Camera => write!(f, "camera"),
            Permission::RecordAudio => write!(f, "record_audio"),
        }
    }
}

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
        }
    }
}

/// Permissions a session request needs: the camera always, the microphone
/// only when the request records.
pub fn required_permissions(request: &SessionRequest) -> Vec<Permission> {
    let mut permissions = vec![Permission::Camera];
    if request.wants_recording {
        permissions.push(Permission::RecordAudio);
    }
    permissions
}

/// Result of an asynchronous permission request delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PermissionsResult {
    pub request_code: u32,
    pub grants: Vec<(Permission, PermissionStatus)>,
}

impl PermissionsResult {
    /// `None` when the result belongs to a request this service did not make.
    pub fn all_granted(&self) -> Option<bool> {
        if self.request_code != PERMISSIONS_REQUEST_CODE {
            return None;
        }
        Some(!self.grants.is_empty() && self.grants.iter().all(|(_, s)| s.is_granted()))
    }

    /// The transient notice shown to the user for this result.
    pub fn notice(&self) -> Option<&'static str> {
        self.all_granted().map(|granted| {
            if granted {
                "Permissions granted."
            } else {
                "Permissions denied."
            }
        })
    }
}
