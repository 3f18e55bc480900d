//! Host callback objects.
//!
//! The host may invoke these from any thread. They never touch session
//! state; each call becomes a [`TaggedEvent`] on the lifecycle's event queue,
//! stamped with the generation of the start attempt that issued it.

use std::fmt;
use tokio::sync::mpsc;

use super::{CaptureSessionHandle, DeviceHandle};

pub enum HostEvent {
    DeviceOpened(Box<dyn DeviceHandle>),
    DeviceDisconnected,
    DeviceError(i32),
    SessionConfigured(Box<dyn CaptureSessionHandle>),
    SessionConfigureFailed,
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::DeviceOpened(_) => "device_opened",
            HostEvent::DeviceDisconnected => "device_disconnected",
            HostEvent::DeviceError(_) => "device_error",
            HostEvent::SessionConfigured(_) => "session_configured",
            HostEvent::SessionConfigureFailed => "session_configure_failed",
        }
    }

    /// Close whatever handle the event carries. Used when nobody will
    /// ever receive it.
    pub(crate) fn close_carried_handle(self) {
        match self {
            HostEvent::DeviceOpened(mut device) => device.close(),
            HostEvent::SessionConfigured(mut session) => session.close(),
            _ => {}
        }
    }
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::DeviceOpened(device) => write!(f, "DeviceOpened({})", device.id()),
            HostEvent::DeviceError(code) => write!(f, "DeviceError({code})"),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug)]
pub struct TaggedEvent {
    pub generation: u64,
    pub event: HostEvent,
}

pub(crate) type EventSender = mpsc::UnboundedSender<TaggedEvent>;
pub(crate) type EventReceiver = mpsc::UnboundedReceiver<TaggedEvent>;

fn deliver(tx: &EventSender, generation: u64, event: HostEvent) {
    if let Err(mpsc::error::SendError(undelivered)) = tx.send(TaggedEvent { generation, event }) {
        log::debug!(
            "Lifecycle gone, dropping {:?} for generation {}",
            undelivered.event,
            generation
        );
        undelivered.event.close_carried_handle();
    }
}

/// Device state callback, valid for the whole lifetime of the device.
#[derive(Clone)]
pub struct DeviceCallback {
    generation: u64,
    tx: EventSender,
}

impl DeviceCallback {
    pub(crate) fn new(generation: u64, tx: EventSender) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn on_opened(&self, device: Box<dyn DeviceHandle>) {
        deliver(&self.tx, self.generation, HostEvent::DeviceOpened(device));
    }

    /// Carries no handle: before `on_opened` the adapter closes the device,
    /// afterwards the lifecycle does.
    pub fn on_disconnected(&self) {
        deliver(&self.tx, self.generation, HostEvent::DeviceDisconnected);
    }

    pub fn on_error(&self, code: i32) {
        deliver(&self.tx, self.generation, HostEvent::DeviceError(code));
    }
}

/// Session state callback for one configure attempt.
#[derive(Clone)]
pub struct SessionCallback {
    generation: u64,
    tx: EventSender,
}

impl SessionCallback {
    pub(crate) fn new(generation: u64, tx: EventSender) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn on_configured(&self, session: Box<dyn CaptureSessionHandle>) {
        deliver(&self.tx, self.generation, HostEvent::SessionConfigured(session));
    }

    pub fn on_configure_failed(&self) {
        deliver(&self.tx, self.generation, HostEvent::SessionConfigureFailed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceId;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct FlagDevice {
        id: DeviceId,
        closed: Arc<AtomicBool>,
    }

    impl DeviceHandle for FlagDevice {
        fn id(&self) -> &DeviceId {
            &self.id
        }

        fn create_capture_session(
            &mut self,
            _targets: &[crate::types::SurfaceId],
            _callback: SessionCallback,
        ) -> Result<(), crate::errors::HostError> {
            Ok(())
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_events_carry_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = DeviceCallback::new(7, tx);
        callback.on_error(3);

        let tagged = rx.try_recv().unwrap();
        assert_eq!(tagged.generation, 7);
        assert!(matches!(tagged.event, HostEvent::DeviceError(3)));
    }

    #[test]
    fn test_undeliverable_device_is_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let closed = Arc::new(AtomicBool::new(false));
        let callback = DeviceCallback::new(1, tx);
        callback.on_opened(Box::new(FlagDevice {
            id: DeviceId::new("1"),
            closed: closed.clone(),
        }));
        assert!(closed.load(Ordering::SeqCst));
    }
}
