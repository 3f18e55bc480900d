//! Service-side host contracts: notification, foreground state, overlay
//! window and broadcasts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::NotificationConfig;
use crate::errors::{CameraError, HostError};
use crate::types::Size;

pub const ACTION_START: &str = "backgroundcam.action.START";
pub const ACTION_START_WITH_PREVIEW: &str = "backgroundcam.action.START_WITH_PREVIEW";
pub const ACTION_STOPPED: &str = "backgroundcam.action.STOPPED";

/// First API level with notification channels and application overlays.
pub const SDK_OREO: u32 = 26;

/// Commands the service can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Background processing only, no overlay.
    Start,
    /// Show a preview overlay and size the capture to it.
    StartWithPreview,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => ACTION_START,
            Action::StartWithPreview => ACTION_START_WITH_PREVIEW,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ACTION_START => Ok(Action::Start),
            ACTION_START_WITH_PREVIEW => Ok(Action::StartWithPreview),
            other => Err(CameraError::InvalidRequest(format!(
                "unknown service action '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    ApplicationOverlay,
    SystemOverlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Translucent,
    Opaque,
}

/// Window parameters for the preview overlay drawn above other apps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLayoutParams {
    pub window_type: WindowType,
    pub touchable: bool,
    pub focusable: bool,
    pub pixel_format: PixelFormat,
}

impl OverlayLayoutParams {
    pub fn for_sdk(sdk_version: u32) -> Self {
        let window_type = if sdk_version < SDK_OREO {
            WindowType::SystemOverlay
        } else {
            WindowType::ApplicationOverlay
        };
        Self {
            window_type,
            touchable: false,
            focusable: false,
            pixel_format: PixelFormat::Translucent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    None,
    Low,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockscreenVisibility {
    Public,
    Private,
    Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub lockscreen_visibility: LockscreenVisibility,
    /// ARGB light color
    pub light_color: u32,
}

pub const COLOR_BLUE: u32 = 0xFF00_00FF;

impl NotificationChannel {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            id: config.channel_id.clone(),
            name: config.channel_name.clone(),
            importance: Importance::None,
            lockscreen_visibility: LockscreenVisibility::Private,
            light_color: COLOR_BLUE,
        }
    }
}

/// The ongoing notification that keeps the service in the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundNotification {
    pub id: u32,
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub ticker: String,
}

impl ForegroundNotification {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            id: config.notification_id,
            channel_id: config.channel_id.clone(),
            title: config.app_name.clone(),
            text: config.app_name.clone(),
            ticker: config.app_name.clone(),
        }
    }
}

/// A view added to the window manager.
pub trait OverlayView: Send {
    /// Size of the rendered preview surface, `None` until it is available.
    fn surface_size(&self) -> Option<Size>;
}

/// Platform services the background service talks to directly.
pub trait ServiceHost: Send + 'static {
    fn sdk_version(&self) -> u32;

    fn create_notification_channel(
        &mut self,
        channel: &NotificationChannel,
    ) -> Result<(), HostError>;

    fn start_foreground(&mut self, notification: &ForegroundNotification)
        -> Result<(), HostError>;

    fn add_overlay_view(
        &mut self,
        params: &OverlayLayoutParams,
    ) -> Result<Box<dyn OverlayView>, HostError>;

    fn remove_overlay_view(&mut self, view: Box<dyn OverlayView>);

    fn send_broadcast(&mut self, action: &str);

    /// Short transient message to the user.
    fn show_notice(&mut self, message: &str);
}
