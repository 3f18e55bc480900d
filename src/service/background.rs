use crate::config::ServiceConfig;
use crate::errors::CameraError;
use crate::permissions::PermissionsResult;
use crate::service::host::{
    Action, ForegroundNotification, NotificationChannel, OverlayLayoutParams, OverlayView,
    ServiceHost, ACTION_STOPPED, SDK_OREO,
};
use crate::service::worker::{CameraService, ServiceEvent};
use crate::session::{SessionRequest, SessionState};
use crate::types::Size;

/// The foreground service shell: turns start actions into session requests
/// and owns the overlay window and notification.
pub struct BackgroundCameraService {
    host: Box<dyn ServiceHost>,
    camera: CameraService,
    config: ServiceConfig,
    overlay: Option<Box<dyn OverlayView>>,
    awaiting_surface: bool,
    foreground: bool,
}

impl BackgroundCameraService {
    pub fn new(host: Box<dyn ServiceHost>, camera: CameraService, config: ServiceConfig) -> Self {
        Self {
            host,
            camera,
            config,
            overlay: None,
            awaiting_surface: false,
            foreground: false,
        }
    }

    pub fn camera(&self) -> &CameraService {
        &self.camera
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// A preview start is waiting for the overlay surface.
    pub fn is_awaiting_surface(&self) -> bool {
        self.awaiting_surface
    }

    /// Register the notification channel (API 26+) and enter the foreground.
    pub fn on_create(&mut self) -> Result<(), CameraError> {
        let notification_config = &self.config.notification;
        if self.host.sdk_version() >= SDK_OREO {
            let channel = NotificationChannel::from_config(notification_config);
            self.host
                .create_notification_channel(&channel)
                .map_err(|e| CameraError::device("create notification channel", e))?;
        }

        let notification = ForegroundNotification::from_config(notification_config);
        self.host
            .start_foreground(&notification)
            .map_err(|e| CameraError::device("start foreground", e))?;
        self.foreground = true;
        log::info!(
            "Service in foreground with notification {}",
            notification.id
        );
        Ok(())
    }

    /// Handle a raw action string as delivered by the host.
    pub async fn on_start_action(&mut self, action: &str) -> Result<(), CameraError> {
        let action: Action = action.parse()?;
        self.on_start_command(action).await
    }

    pub async fn on_start_command(&mut self, action: Action) -> Result<(), CameraError> {
        log::info!("Start command {}", action);
        match action {
            Action::Start => {
                self.awaiting_surface = false;
                let viewport = self.config.camera.background_viewport();
                let request = self.session_request(SessionRequest::background(viewport));
                self.camera.start(request).await
            }
            Action::StartWithPreview => {
                if self.overlay.is_none() {
                    let params = OverlayLayoutParams::for_sdk(self.host.sdk_version());
                    let view = self
                        .host
                        .add_overlay_view(&params)
                        .map_err(|e| CameraError::device("add overlay view", e))?;
                    self.overlay = Some(view);
                }

                match self.overlay.as_ref().and_then(|view| view.surface_size()) {
                    Some(size) => self.start_preview(size).await,
                    None => {
                        log::debug!("Overlay surface not ready, deferring camera start");
                        self.awaiting_surface = true;
                        Ok(())
                    }
                }
            }
        }
    }

    /// The overlay's preview surface was rendered at `size`.
    pub async fn on_surface_available(&mut self, size: Size) -> Result<(), CameraError> {
        if !self.awaiting_surface {
            log::debug!("Surface {} available with no pending preview start", size);
            return Ok(());
        }
        self.start_preview(size).await
    }

    pub fn on_permissions_result(&mut self, result: &PermissionsResult) {
        match result.notice() {
            Some(notice) => {
                self.host.show_notice(notice);
                self.camera.emit(ServiceEvent::Notice {
                    message: notice.to_string(),
                });
            }
            None => log::debug!(
                "Ignoring permission result for request code {}",
                result.request_code
            ),
        }
    }

    /// Stop the camera, remove the overlay and announce `STOPPED`.
    pub async fn on_destroy(&mut self) -> Result<SessionState, CameraError> {
        self.awaiting_surface = false;
        let state = self.camera.stop().await?;

        if let Some(view) = self.overlay.take() {
            self.host.remove_overlay_view(view);
        }
        self.host.send_broadcast(ACTION_STOPPED);
        self.foreground = false;
        self.camera.emit(ServiceEvent::Stopped);
        log::info!("Background camera service destroyed");
        Ok(state)
    }

    async fn start_preview(&mut self, size: Size) -> Result<(), CameraError> {
        self.awaiting_surface = false;
        let request = self.session_request(SessionRequest::with_preview(size));
        self.camera.start(request).await
    }

    fn session_request(&self, base: SessionRequest) -> SessionRequest {
        base.with_frame_sink(self.config.frame_sink.enabled)
            .with_recording(self.config.recording.enabled)
    }
}
