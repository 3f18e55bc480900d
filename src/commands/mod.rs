//! Tauri plugin exposing the background camera service

pub mod service;

pub use service::*;

use tauri::{
    plugin::{Builder, TauriPlugin},
    AppHandle, Emitter, Runtime,
};
use tokio::sync::broadcast::error::RecvError;

use crate::config::ServiceConfig;
use crate::platform::CameraHost;
use crate::service::{BackgroundCameraService, CameraService, ServiceHost};

/// Event name under which every [`crate::ServiceEvent`] is emitted.
pub const SERVICE_EVENT: &str = "backgroundcam://event";

/// Initialize the backgroundcam plugin with the host implementations of the
/// running platform.
pub fn init<R, C, S>(camera_host: C, service_host: S, config: ServiceConfig) -> TauriPlugin<R>
where
    R: Runtime,
    C: CameraHost,
    S: ServiceHost,
{
    Builder::new("backgroundcam")
        .invoke_handler(tauri::generate_handler![
            service::start_background_camera,
            service::start_camera_with_preview,
            service::preview_surface_available,
            service::stop_background_camera,
            service::acknowledge_camera_failure,
            service::get_camera_status,
            service::camera_permissions_result,
            service::select_capture_size,
        ])
        .setup(move |app, _api| {
            let (camera, worker) = CameraService::new(camera_host, config.clone());
            tauri::async_runtime::spawn(worker.run());
            forward_events(app.clone(), &camera);

            let mut background = BackgroundCameraService::new(Box::new(service_host), camera, config);
            background.on_create()?;

            let mut slot = SERVICE
                .try_lock()
                .map_err(|_| "camera service slot is busy during setup")?;
            *slot = Some(background);
            log::info!("backgroundcam plugin initialized");
            Ok(())
        })
        .build()
}

fn forward_events<R: Runtime>(app: AppHandle<R>, camera: &CameraService) {
    let mut events = camera.subscribe();
    tauri::async_runtime::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = app.emit(SERVICE_EVENT, event) {
                        log::warn!("Failed to emit service event: {}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Event forwarder lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
