use std::sync::Arc;
use tauri::command;
use tokio::sync::Mutex as AsyncMutex;

use crate::errors::CameraError;
use crate::permissions::PermissionsResult;
use crate::selector::{select_with_policy, AspectPolicy};
use crate::service::{Action, BackgroundCameraService, ServiceStatus};
use crate::session::SessionState;
use crate::types::Size;

// Global service slot, filled once by the plugin setup
lazy_static::lazy_static! {
    pub(crate) static ref SERVICE: Arc<AsyncMutex<Option<BackgroundCameraService>>> =
        Arc::new(AsyncMutex::new(None));
}

fn not_initialized() -> String {
    "Camera service not initialized".to_string()
}

fn service_mut(
    slot: &mut Option<BackgroundCameraService>,
) -> Result<&mut BackgroundCameraService, String> {
    slot.as_mut().ok_or_else(not_initialized)
}

fn report(e: CameraError) -> String {
    log::error!("Camera service command failed: {}", e);
    e.to_string()
}

/// Start capture without preview (background processing only)
#[command]
pub async fn start_background_camera() -> Result<ServiceStatus, String> {
    log::info!("Starting background camera");
    let mut slot = SERVICE.lock().await;
    let service = service_mut(&mut slot)?;
    service
        .on_start_command(Action::Start)
        .await
        .map_err(report)?;
    Ok(service.camera().status())
}

/// Show the overlay and start capture sized to its surface
#[command]
pub async fn start_camera_with_preview() -> Result<ServiceStatus, String> {
    log::info!("Starting camera with preview overlay");
    let mut slot = SERVICE.lock().await;
    let service = service_mut(&mut slot)?;
    service
        .on_start_command(Action::StartWithPreview)
        .await
        .map_err(report)?;
    Ok(service.camera().status())
}

/// Report that the overlay surface has been rendered
#[command]
pub async fn preview_surface_available(width: u32, height: u32) -> Result<ServiceStatus, String> {
    let size = Size::try_new(width, height).map_err(|e| e.to_string())?;
    let mut slot = SERVICE.lock().await;
    let service = service_mut(&mut slot)?;
    service.on_surface_available(size).await.map_err(report)?;
    Ok(service.camera().status())
}

/// Stop capture, remove the overlay and broadcast STOPPED
#[command]
pub async fn stop_background_camera() -> Result<SessionState, String> {
    log::info!("Stopping background camera");
    let mut slot = SERVICE.lock().await;
    let service = service_mut(&mut slot)?;
    service.on_destroy().await.map_err(report)
}

/// Leave the failed state
#[command]
pub async fn acknowledge_camera_failure() -> Result<SessionState, String> {
    let slot = SERVICE.lock().await;
    let service = slot.as_ref().ok_or_else(not_initialized)?;
    service.camera().acknowledge().await.map_err(report)
}

#[command]
pub async fn get_camera_status() -> Result<ServiceStatus, String> {
    let slot = SERVICE.lock().await;
    slot.as_ref()
        .map(|service| service.camera().status())
        .ok_or_else(not_initialized)
}

/// Forward the user's answer to a permission request
#[command]
pub async fn camera_permissions_result(result: PermissionsResult) -> Result<(), String> {
    let mut slot = SERVICE.lock().await;
    let service = service_mut(&mut slot)?;
    service.on_permissions_result(&result);
    Ok(())
}

/// Pick the best capture size for a viewport
#[command]
pub async fn select_capture_size(
    candidates: Vec<Size>,
    target: Size,
    policy: Option<AspectPolicy>,
) -> Result<Size, String> {
    if !target.is_valid() {
        return Err(format!("Invalid target size {}", target));
    }
    Ok(select_with_policy(
        &candidates,
        target,
        policy.unwrap_or_default(),
    ))
}
