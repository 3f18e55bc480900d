//! In-process service host that records what the service asked for.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::HostError;
use crate::service::{
    ForegroundNotification, NotificationChannel, OverlayLayoutParams, OverlayView, ServiceHost,
};
use crate::types::Size;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOp {
    ChannelCreated(NotificationChannel),
    ForegroundStarted(ForegroundNotification),
    OverlayAdded(OverlayLayoutParams),
    OverlayRemoved,
    Broadcast(String),
    Notice(String),
}

struct ServiceState {
    sdk_version: u32,
    overlay_surface: Option<Size>,
    overlays: usize,
    journal: Vec<ServiceOp>,
}

fn lock(shared: &Arc<Mutex<ServiceState>>) -> MutexGuard<'_, ServiceState> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Cloning shares the recorded state, so a test can keep one copy and hand
/// the other to the service.
#[derive(Clone)]
pub struct SimulatedServiceHost {
    shared: Arc<Mutex<ServiceState>>,
}

impl Default for SimulatedServiceHost {
    fn default() -> Self {
        Self::new(33)
    }
}

impl SimulatedServiceHost {
    pub fn new(sdk_version: u32) -> Self {
        Self {
            shared: Arc::new(Mutex::new(ServiceState {
                sdk_version,
                overlay_surface: None,
                overlays: 0,
                journal: Vec::new(),
            })),
        }
    }

    /// Overlays added from now on report this surface size immediately.
    pub fn with_overlay_surface(self, size: Option<Size>) -> Self {
        lock(&self.shared).overlay_surface = size;
        self
    }

    pub fn journal(&self) -> Vec<ServiceOp> {
        lock(&self.shared).journal.clone()
    }

    pub fn overlays(&self) -> usize {
        lock(&self.shared).overlays
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|op| match op {
                ServiceOp::Broadcast(action) => Some(action),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|op| match op {
                ServiceOp::Notice(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

struct SimOverlay {
    surface: Option<Size>,
}

impl OverlayView for SimOverlay {
    fn surface_size(&self) -> Option<Size> {
        self.surface
    }
}

impl ServiceHost for SimulatedServiceHost {
    fn sdk_version(&self) -> u32 {
        lock(&self.shared).sdk_version
    }

    fn create_notification_channel(
        &mut self,
        channel: &NotificationChannel,
    ) -> Result<(), HostError> {
        lock(&self.shared)
            .journal
            .push(ServiceOp::ChannelCreated(channel.clone()));
        Ok(())
    }

    fn start_foreground(
        &mut self,
        notification: &ForegroundNotification,
    ) -> Result<(), HostError> {
        lock(&self.shared)
            .journal
            .push(ServiceOp::ForegroundStarted(notification.clone()));
        Ok(())
    }

    fn add_overlay_view(
        &mut self,
        params: &OverlayLayoutParams,
    ) -> Result<Box<dyn OverlayView>, HostError> {
        let mut state = lock(&self.shared);
        state.overlays += 1;
        state.journal.push(ServiceOp::OverlayAdded(*params));
        Ok(Box::new(SimOverlay {
            surface: state.overlay_surface,
        }))
    }

    fn remove_overlay_view(&mut self, _view: Box<dyn OverlayView>) {
        let mut state = lock(&self.shared);
        state.overlays = state.overlays.saturating_sub(1);
        state.journal.push(ServiceOp::OverlayRemoved);
    }

    fn send_broadcast(&mut self, action: &str) {
        lock(&self.shared)
            .journal
            .push(ServiceOp::Broadcast(action.to_string()));
    }

    fn show_notice(&mut self, message: &str) {
        lock(&self.shared)
            .journal
            .push(ServiceOp::Notice(message.to_string()));
    }
}
