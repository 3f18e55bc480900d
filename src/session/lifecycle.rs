use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::assert_invariant;
use crate::config::ServiceConfig;
use crate::errors::CameraError;
use crate::permissions::{required_permissions, Permission, PERMISSIONS_REQUEST_CODE};
use crate::platform::callbacks::{EventReceiver, EventSender};
use crate::platform::{
    CameraHost, CaptureSessionHandle, DeviceCallback, DeviceHandle, HostEvent, SessionCallback,
    TaggedEvent,
};
use crate::recording::{next_output_path, EncoderSettings, RecorderSink, RecordingFailurePolicy};
use crate::selector::{select_with_policy, FALLBACK_SIZE};
use crate::session::bundle::CaptureSession;
use crate::session::frames::{FrameCallback, FrameDispatch};
use crate::session::request::SessionRequest;
use crate::session::state::{SessionState, Transition};
use crate::types::{CaptureRequest, CaptureTemplate, DeviceCharacteristics, DeviceId, Size};

/// Queue on which host callbacks arrive for a [`Lifecycle`].
pub type HostEventReceiver = EventReceiver;

/// Something observers of the lifecycle should hear about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Transition(Transition),
    Failed { kind: String, message: String },
    PermissionsRequested { permissions: Vec<Permission> },
    RecordingStarted { path: PathBuf },
}

/// Event-driven capture session state machine.
///
/// Commands (`start`, `stop`, `acknowledge`) and host callbacks
/// (`handle_event`) are the only inputs. The owner must call them from one
/// logical thread; the service worker does exactly that.
pub struct Lifecycle<H: CameraHost> {
    host: H,
    config: ServiceConfig,
    state: SessionState,
    generation: u64,
    request: Option<SessionRequest>,
    bundle: CaptureSession,
    last_error: Option<CameraError>,
    events_tx: EventSender,
    frames: Arc<FrameDispatch>,
    journal: Vec<LifecycleEvent>,
}

impl<H: CameraHost> Lifecycle<H> {
    pub fn new(host: H, config: ServiceConfig) -> (Self, HostEventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let lifecycle = Self {
            host,
            config,
            state: SessionState::Idle,
            generation: 0,
            request: None,
            bundle: CaptureSession::default(),
            last_error: None,
            events_tx,
            frames: FrameDispatch::new(),
            journal: Vec::new(),
        };
        (lifecycle, events_rx)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> Option<&SessionRequest> {
        self.request.as_ref()
    }

    pub fn bundle(&self) -> &CaptureSession {
        &self.bundle
    }

    pub fn last_error(&self) -> Option<&CameraError> {
        self.last_error.as_ref()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn frames(&self) -> Arc<FrameDispatch> {
        Arc::clone(&self.frames)
    }

    pub fn set_frame_callback(&self, callback: Option<FrameCallback>) {
        self.frames.set_callback(callback);
    }

    /// Drain everything observers have not seen yet.
    pub fn take_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.journal)
    }

    /// Feed every host event already queued. Returns how many were handled.
    pub fn pump(&mut self, events: &mut HostEventReceiver) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Begin a new session. A running session is torn down first.
    ///
    /// Only an invalid request is reported here; every later failure moves
    /// the lifecycle to `Failed` instead.
    pub fn start(&mut self, request: SessionRequest) -> Result<(), CameraError> {
        request.validate()?;

        match self.state {
            SessionState::Idle => {}
            SessionState::Failed => self.acknowledge(),
            SessionState::Opening | SessionState::Configuring | SessionState::Active => {
                log::info!("Start requested while {}, tearing down first", self.state);
                self.teardown();
            }
            SessionState::Stopping => self.finish_teardown(),
        }

        self.generation += 1;
        self.request = Some(request);
        self.last_error = None;
        self.transition(SessionState::Opening);

        if let Err(e) = self.begin_open(request) {
            self.fail(e);
        }
        Ok(())
    }

    /// Tear down from any state. Stopping an idle lifecycle does nothing.
    pub fn stop(&mut self) {
        match self.state {
            SessionState::Idle | SessionState::Stopping => {
                log::debug!("Stop requested while {}, nothing to do", self.state);
            }
            SessionState::Failed => self.acknowledge(),
            SessionState::Opening | SessionState::Configuring | SessionState::Active => {
                self.teardown()
            }
        }
    }

    /// Leave `Failed`, releasing anything still held.
    pub fn acknowledge(&mut self) {
        if self.state != SessionState::Failed {
            return;
        }
        self.bundle.close_all();
        self.request = None;
        self.transition(SessionState::Idle);
    }

    pub fn handle_event(&mut self, tagged: TaggedEvent) {
        let TaggedEvent { generation, event } = tagged;
        let current = generation == self.generation;

        match event {
            HostEvent::DeviceOpened(device) => {
                if current && self.state == SessionState::Opening {
                    self.on_device_opened(device);
                } else {
                    log::debug!(
                        "Late open of camera {} (generation {}, now {} in {}), closing it",
                        device.id(),
                        generation,
                        self.generation,
                        self.state
                    );
                    let mut device = device;
                    device.close();
                }
            }
            HostEvent::SessionConfigured(session) => {
                if current && self.state == SessionState::Configuring {
                    self.on_session_configured(session);
                } else {
                    log::debug!("Late session configuration (generation {}), closing it", generation);
                    let mut session = session;
                    session.close();
                }
            }
            HostEvent::SessionConfigureFailed => {
                if current && self.state == SessionState::Configuring {
                    self.fail(CameraError::DeviceUnavailable(
                        "capture session configuration failed".to_string(),
                    ));
                } else {
                    log::debug!("Ignoring stale configure failure (generation {})", generation);
                }
            }
            HostEvent::DeviceDisconnected => {
                if !current || !self.state.is_busy() {
                    log::debug!("Ignoring stale disconnect (generation {})", generation);
                    return;
                }
                let id = self.device_label();
                if self.state == SessionState::Active {
                    self.bundle.discard_session();
                    self.fail(CameraError::Disconnected(id));
                } else {
                    self.fail(CameraError::DeviceUnavailable(format!(
                        "camera {id} disconnected while {}",
                        self.state
                    )));
                }
            }
            HostEvent::DeviceError(code) => {
                if !current || !self.state.is_busy() {
                    log::debug!("Ignoring stale device error {} (generation {})", code, generation);
                    return;
                }
                if self.state == SessionState::Active {
                    self.bundle.discard_session();
                }
                let id = self.device_label();
                self.fail(CameraError::DeviceUnavailable(format!(
                    "camera {id} reported error {code}"
                )));
            }
        }
    }

    fn device_label(&self) -> String {
        self.bundle
            .device
            .as_ref()
            .map(|d| d.id().to_string())
            .unwrap_or_else(|| "<pending>".to_string())
    }

    fn begin_open(&mut self, request: SessionRequest) -> Result<(), CameraError> {
        let missing: Vec<Permission> = required_permissions(&request)
            .into_iter()
            .filter(|p| !self.host.check_permission(*p).is_granted())
            .collect();
        if !missing.is_empty() {
            self.host
                .request_permissions(&missing, PERMISSIONS_REQUEST_CODE);
            self.journal.push(LifecycleEvent::PermissionsRequested {
                permissions: missing.clone(),
            });
            return Err(CameraError::PermissionDenied(missing));
        }

        let (id, characteristics) = self.find_device()?;
        let size = select_with_policy(
            &characteristics.output_sizes,
            request.viewport,
            self.config.camera.aspect_policy,
        );
        self.bundle.capture_size = Some(size);

        log::info!(
            "Opening camera {} at {} for viewport {}",
            id,
            size,
            request.viewport
        );
        let callback = DeviceCallback::new(self.generation, self.events_tx.clone());
        self.host
            .open_device(&id, callback)
            .map_err(|e| CameraError::device("open camera", e))
    }

    /// First device whose facing matches the configured one.
    fn find_device(&self) -> Result<(DeviceId, DeviceCharacteristics), CameraError> {
        let facing = self.config.camera.facing;
        let ids = self
            .host
            .camera_id_list()
            .map_err(|e| CameraError::device("list cameras", e))?;

        for id in ids {
            match self.host.characteristics(&id) {
                Ok(characteristics) if characteristics.facing == facing => {
                    return Ok((id, characteristics));
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping camera {}: {}", id, e),
            }
        }

        Err(CameraError::DeviceUnavailable(format!(
            "no {:?} facing camera found",
            facing
        )))
    }

    fn on_device_opened(&mut self, device: Box<dyn DeviceHandle>) {
        log::info!("Camera {} opened", device.id());
        self.bundle.device = Some(device);
        self.transition(SessionState::Configuring);

        if let Err(e) = self.configure() {
            self.fail(e);
        }
    }

    /// Build the sinks the request asks for and ask the device for a session
    /// over all of them.
    fn configure(&mut self) -> Result<(), CameraError> {
        let request = self
            .request
            .ok_or_else(|| CameraError::InvalidRequest("no active request".to_string()))?;
        let size = self.bundle.capture_size.unwrap_or(FALLBACK_SIZE);

        if request.wants_preview {
            let preview = self
                .host
                .create_preview_surface(size)
                .map_err(|e| CameraError::device("create preview surface", e))?;
            self.bundle.preview = Some(preview);
        }

        if request.wants_frame_sink {
            let sink = &self.config.frame_sink;
            let reader = self
                .host
                .create_image_reader(size, sink.format, sink.max_images, self.frames.listener())
                .map_err(|e| CameraError::device("create image reader", e))?;
            self.bundle.frame_reader = Some(reader);
        }

        if request.wants_recording {
            if let Err(e) = self.prepare_recorder(size) {
                match self.config.recording.failure_policy {
                    RecordingFailurePolicy::Abort => return Err(e),
                    RecordingFailurePolicy::ContinueWithoutRecording => {
                        log::warn!("Continuing without recording: {}", e);
                    }
                }
            }
        }

        let targets = self.bundle.targets();
        if targets.is_empty() {
            return Err(CameraError::InvalidRequest(
                "no output sinks left to configure".to_string(),
            ));
        }

        let callback = SessionCallback::new(self.generation, self.events_tx.clone());
        let device = self.bundle.device.as_mut().ok_or_else(|| {
            CameraError::DeviceUnavailable("camera closed before configuration".to_string())
        })?;
        log::debug!("Configuring session on {} with {} targets", device.id(), targets.len());
        device
            .create_capture_session(&targets, callback)
            .map_err(|e| CameraError::device("create capture session", e))
    }

    fn prepare_recorder(&mut self, size: Size) -> Result<(), CameraError> {
        let encoder = self
            .host
            .create_encoder()
            .map_err(|e| CameraError::encoder("create encoder", e))?;
        let path = next_output_path(
            self.host.external_files_dir().as_deref(),
            self.config.recording.output_format,
        );
        let settings = EncoderSettings::new(&self.config.recording, size, path);
        let recorder = RecorderSink::prepare(encoder, settings)?;

        // The encoder is fed alongside a preview surface; reuse the overlay one.
        if self.bundle.preview.is_none() {
            match self.host.create_preview_surface(size) {
                Ok(feed) => self.bundle.preview_feed = Some(feed),
                Err(e) => {
                    recorder.release();
                    return Err(CameraError::encoder("create recorder preview feed", e));
                }
            }
        }

        self.bundle.recorder = Some(recorder);
        Ok(())
    }

    fn on_session_configured(&mut self, session: Box<dyn CaptureSessionHandle>) {
        self.bundle.session = Some(session);
        assert_invariant!(
            self.bundle.sink_count() > 0,
            "Configured session has at least one sink",
            "lifecycle"
        );

        match self.activate() {
            Ok(()) => self.transition(SessionState::Active),
            Err(e) => self.fail(e),
        }
    }

    /// Start the recorder (if any) and the repeating capture.
    fn activate(&mut self) -> Result<(), CameraError> {
        if let Some(recorder) = self.bundle.recorder.as_mut() {
            match recorder.start() {
                Ok(()) => {
                    let path = recorder.output_path().to_path_buf();
                    self.journal.push(LifecycleEvent::RecordingStarted { path });
                }
                Err(e) => match self.config.recording.failure_policy {
                    RecordingFailurePolicy::Abort => return Err(e),
                    RecordingFailurePolicy::ContinueWithoutRecording => {
                        log::warn!("Continuing without recording: {}", e);
                        self.bundle.drop_recorder();
                    }
                },
            }
        }

        let template = if self.bundle.recorder.is_some() {
            CaptureTemplate::Record
        } else {
            CaptureTemplate::Preview
        };
        let capture = CaptureRequest::new(template, self.bundle.targets());
        let session = self.bundle.session.as_mut().ok_or_else(|| {
            CameraError::CaptureFailed("session closed before capture start".to_string())
        })?;
        session
            .set_repeating_request(&capture)
            .map_err(|e| CameraError::CaptureFailed(format!("set repeating request: {e}")))?;

        log::info!(
            "Capture running: {:?} into {} targets",
            capture.template,
            capture.targets.len()
        );
        Ok(())
    }

    fn teardown(&mut self) {
        self.transition(SessionState::Stopping);
        self.finish_teardown();
    }

    fn finish_teardown(&mut self) {
        self.bundle.close_all();
        self.request = None;
        self.transition(SessionState::Idle);
    }

    fn fail(&mut self, error: CameraError) {
        log::error!("Camera session failed: {}", error);
        self.bundle.close_all();
        self.transition(SessionState::Failed);
        self.journal.push(LifecycleEvent::Failed {
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
        self.last_error = Some(error);
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        assert_invariant!(
            from.can_transition_to(to),
            "Lifecycle transitions follow the state table",
            "lifecycle"
        );
        log::info!(
            "Camera session {} -> {} (generation {})",
            from,
            to,
            self.generation
        );
        self.state = to;
        self.journal.push(LifecycleEvent::Transition(Transition {
            from,
            to,
            generation: self.generation,
        }));
    }
}

impl<H: CameraHost> Drop for Lifecycle<H> {
    fn drop(&mut self) {
        if self.state.is_busy() {
            self.teardown();
        }
    }
}
