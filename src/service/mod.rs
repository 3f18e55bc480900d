//! Background camera service
//!
//! Two layers:
//! - [`CameraService`] / [`ServiceWorker`]: the actor that confines the
//!   capture lifecycle to one task
//! - [`BackgroundCameraService`]: the foreground-service shell that reacts
//!   to `START` and `START_WITH_PREVIEW`, manages the preview overlay and
//!   notification, and broadcasts `STOPPED` on destroy

mod background;
pub mod host;
mod worker;

pub use background::BackgroundCameraService;
pub use host::{
    Action, ForegroundNotification, NotificationChannel, OverlayLayoutParams, OverlayView,
    ServiceHost, ACTION_START, ACTION_START_WITH_PREVIEW, ACTION_STOPPED,
};
pub use worker::{CameraService, ServiceEvent, ServiceStatus, ServiceWorker};
