//! Single-owner actor around the capture lifecycle.
//!
//! The worker owns the [`Lifecycle`] and is the only place it is touched.
//! Commands from [`CameraService`] handles and host callbacks are both
//! queued and handled one at a time. After every input the worker publishes
//! the current [`ServiceStatus`] on a watch channel and forwards lifecycle
//! events as [`ServiceEvent`]s on a broadcast channel.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::config::ServiceConfig;
use crate::errors::CameraError;
use crate::permissions::Permission;
use crate::platform::CameraHost;
use crate::session::{
    FrameCallback, FrameDispatch, HostEventReceiver, Lifecycle, LifecycleEvent, SessionRequest,
    SessionState,
};
use crate::types::Size;

const EVENT_BUFFER: usize = 64;

/// Snapshot of the service published after every handled input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub state: SessionState,
    pub generation: u64,
    pub capture_size: Option<Size>,
    pub recording_path: Option<PathBuf>,
    pub last_error: Option<String>,
    pub frames_delivered: u64,
    pub updated_at: DateTime<Utc>,
}

impl ServiceStatus {
    fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            capture_size: None,
            recording_path: None,
            last_error: None,
            frames_delivered: 0,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
        generation: u64,
    },
    Failed {
        kind: String,
        message: String,
    },
    PermissionsRequested {
        permissions: Vec<Permission>,
    },
    RecordingStarted {
        path: PathBuf,
    },
    /// Message shown to the user.
    Notice {
        message: String,
    },
    /// The service was destroyed and the `STOPPED` broadcast sent.
    Stopped,
}

impl From<LifecycleEvent> for ServiceEvent {
    fn from(event: LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::Transition(t) => ServiceEvent::StateChanged {
                from: t.from,
                to: t.to,
                generation: t.generation,
            },
            LifecycleEvent::Failed { kind, message } => ServiceEvent::Failed { kind, message },
            LifecycleEvent::PermissionsRequested { permissions } => {
                ServiceEvent::PermissionsRequested { permissions }
            }
            LifecycleEvent::RecordingStarted { path } => ServiceEvent::RecordingStarted { path },
        }
    }
}

enum ServiceCommand {
    Start {
        request: SessionRequest,
        reply: oneshot::Sender<Result<(), CameraError>>,
    },
    Stop {
        reply: oneshot::Sender<SessionState>,
    },
    Acknowledge {
        reply: oneshot::Sender<SessionState>,
    },
    Shutdown,
}

/// Cloneable handle to a running [`ServiceWorker`].
#[derive(Clone)]
pub struct CameraService {
    commands: mpsc::UnboundedSender<ServiceCommand>,
    status: watch::Receiver<ServiceStatus>,
    events: broadcast::Sender<ServiceEvent>,
    frames: Arc<FrameDispatch>,
}

impl CameraService {
    /// Build a handle and the worker that must be spawned to serve it.
    pub fn new<H: CameraHost>(host: H, config: ServiceConfig) -> (Self, ServiceWorker<H>) {
        let (lifecycle, host_events) = Lifecycle::new(host, config);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ServiceStatus::idle());
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let frames = lifecycle.frames();

        let handle = Self {
            commands: commands_tx,
            status: status_rx,
            events: events_tx.clone(),
            frames,
        };
        let worker = ServiceWorker {
            lifecycle,
            host_events,
            commands: commands_rx,
            status_tx,
            events_tx,
        };
        (handle, worker)
    }

    /// Convenience for callers already inside a tokio runtime.
    pub fn spawn<H: CameraHost>(host: H, config: ServiceConfig) -> Self {
        let (handle, worker) = Self::new(host, config);
        tokio::spawn(worker.run());
        handle
    }

    fn send(&self, command: ServiceCommand) -> Result<(), CameraError> {
        self.commands
            .send(command)
            .map_err(|_| CameraError::ServiceUnavailable)
    }

    /// Ask the worker to start a session. Returns once the open has been
    /// issued; progress is reported through state and events.
    pub async fn start(&self, request: SessionRequest) -> Result<(), CameraError> {
        request.validate()?;
        let (reply, rx) = oneshot::channel();
        self.send(ServiceCommand::Start { request, reply })?;
        rx.await.map_err(|_| CameraError::ServiceUnavailable)?
    }

    /// Tear down the current session. Returns the state afterwards.
    pub async fn stop(&self) -> Result<SessionState, CameraError> {
        let (reply, rx) = oneshot::channel();
        self.send(ServiceCommand::Stop { reply })?;
        rx.await.map_err(|_| CameraError::ServiceUnavailable)
    }

    pub async fn acknowledge(&self) -> Result<SessionState, CameraError> {
        let (reply, rx) = oneshot::channel();
        self.send(ServiceCommand::Acknowledge { reply })?;
        rx.await.map_err(|_| CameraError::ServiceUnavailable)
    }

    /// Stop the worker task. Any session is torn down first.
    pub fn shutdown(&self) {
        let _ = self.send(ServiceCommand::Shutdown);
    }

    pub fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    pub fn status(&self) -> ServiceStatus {
        let mut status = self.status.borrow().clone();
        status.frames_delivered = self.frames.delivered();
        status
    }

    pub fn watch_status(&self) -> watch::Receiver<ServiceStatus> {
        self.status.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.events.subscribe()
    }

    /// Publish an event that did not come from the lifecycle.
    pub(crate) fn emit(&self, event: ServiceEvent) {
        let _ = self.events.send(event);
    }

    /// Wait until the published state satisfies `accept`.
    pub async fn wait_for_state<F>(&self, mut accept: F) -> Result<SessionState, CameraError>
    where
        F: FnMut(SessionState) -> bool,
    {
        let mut status = self.status.clone();
        let seen = status
            .wait_for(|s| accept(s.state))
            .await
            .map_err(|_| CameraError::ServiceUnavailable)?;
        Ok(seen.state)
    }

    pub fn set_frame_callback(&self, callback: Option<FrameCallback>) {
        self.frames.set_callback(callback);
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames.delivered()
    }
}

/// The task that owns the lifecycle. Spawn [`ServiceWorker::run`] on any
/// tokio runtime.
pub struct ServiceWorker<H: CameraHost> {
    lifecycle: Lifecycle<H>,
    host_events: HostEventReceiver,
    commands: mpsc::UnboundedReceiver<ServiceCommand>,
    status_tx: watch::Sender<ServiceStatus>,
    events_tx: broadcast::Sender<ServiceEvent>,
}

impl<H: CameraHost> ServiceWorker<H> {
    pub async fn run(mut self) {
        log::debug!("Camera service worker started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ServiceCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.host_events.recv() => {
                    log::debug!("Host event {:?} (generation {})", event.event, event.generation);
                    self.lifecycle.handle_event(event);
                    self.publish();
                }
            }
        }

        self.lifecycle.stop();
        self.publish();
        log::debug!("Camera service worker stopped");
    }

    /// Replies go out after publishing, so a caller that awaited a command
    /// already sees its effects in status and events.
    fn handle_command(&mut self, command: ServiceCommand) {
        match command {
            ServiceCommand::Start { request, reply } => {
                let result = self.lifecycle.start(request);
                self.publish();
                let _ = reply.send(result);
            }
            ServiceCommand::Stop { reply } => {
                self.lifecycle.stop();
                self.publish();
                let _ = reply.send(self.lifecycle.state());
            }
            ServiceCommand::Acknowledge { reply } => {
                self.lifecycle.acknowledge();
                self.publish();
                let _ = reply.send(self.lifecycle.state());
            }
            ServiceCommand::Shutdown => {}
        }
    }

    fn publish(&mut self) {
        for event in self.lifecycle.take_events() {
            // No subscribers is fine.
            let _ = self.events_tx.send(event.into());
        }

        let bundle = self.lifecycle.bundle();
        let status = ServiceStatus {
            state: self.lifecycle.state(),
            generation: self.lifecycle.generation(),
            capture_size: bundle.capture_size(),
            recording_path: bundle.recording_path().map(|p| p.to_path_buf()),
            last_error: self.lifecycle.last_error().map(|e| e.to_string()),
            frames_delivered: self.lifecycle.frames().delivered(),
            updated_at: Utc::now(),
        };
        self.status_tx.send_replace(status);
    }
}
