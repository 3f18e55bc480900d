//! Scriptable in-process camera host
//!
//! Behaves like a phone with a back and a front camera. Every host call is
//! appended to a journal so tests can assert ordering, and every handle is
//! counted so tests can assert nothing leaks. In manual mode, device opens
//! and session configurations stay pending until the test resolves them
//! through [`SimController`], which is how late callbacks are reproduced.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::HostError;
use crate::permissions::{Permission, PermissionStatus};
use crate::platform::{
    AcquiredImage, CameraHost, CaptureSessionHandle, DeviceCallback, DeviceHandle, EncoderSink,
    ImageAvailableListener, ImageReader, SessionCallback, SurfaceSink,
};
use crate::recording::EncoderSettings;
use crate::types::{
    CaptureRequest, DeviceCharacteristics, DeviceId, Facing, ImageFormat, Size, SurfaceId,
};

/// One observable host interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    PermissionsRequested(Vec<Permission>),
    OpenRequested(DeviceId),
    PreviewSurfaceCreated(SurfaceId, Size),
    ImageReaderCreated {
        surface: SurfaceId,
        size: Size,
        format: ImageFormat,
        max_images: u32,
    },
    EncoderConfigured(EncoderSettings),
    EncoderPrepared(SurfaceId),
    EncoderStarted,
    EncoderStopped,
    EncoderReset,
    EncoderReleased,
    SessionRequested(Vec<SurfaceId>),
    RepeatingRequest(CaptureRequest),
    SessionClosed,
    DeviceClosed(DeviceId),
    SurfaceReleased(SurfaceId),
}

/// Whether asynchronous host work completes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Immediate,
    Manual,
}

#[derive(Default)]
struct Counters {
    devices: usize,
    sessions: usize,
    surfaces: usize,
    encoders: usize,
}

struct SimState {
    devices: Vec<(DeviceId, DeviceCharacteristics)>,
    permissions: HashMap<Permission, PermissionStatus>,
    external_dir: Option<PathBuf>,
    mode: ResponseMode,
    open_error: Option<HostError>,
    open_error_code: Option<i32>,
    fail_configure: bool,
    fail_encoder_prepare: bool,
    fail_encoder_start: bool,
    fail_repeating: bool,
    next_surface: u64,
    journal: Vec<HostOp>,
    pending_opens: VecDeque<(DeviceId, DeviceCallback)>,
    pending_configures: VecDeque<SessionCallback>,
    opened: Vec<DeviceCallback>,
    readers: Vec<(SurfaceId, ImageAvailableListener)>,
    live: Counters,
}

impl SimState {
    fn allocate_surface(&mut self) -> SurfaceId {
        self.next_surface += 1;
        SurfaceId(self.next_surface)
    }
}

fn lock(shared: &Arc<Mutex<SimState>>) -> MutexGuard<'_, SimState> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Default two-camera phone: back camera "0", front camera "1".
pub fn default_devices() -> Vec<(DeviceId, DeviceCharacteristics)> {
    vec![
        (
            DeviceId::new("0"),
            DeviceCharacteristics {
                facing: Facing::Back,
                output_sizes: vec![
                    Size::new(4032, 3024),
                    Size::new(1920, 1080),
                    Size::new(1280, 720),
                    Size::new(640, 480),
                ],
            },
        ),
        (
            DeviceId::new("1"),
            DeviceCharacteristics {
                facing: Facing::Front,
                output_sizes: vec![
                    Size::new(1920, 1080),
                    Size::new(1280, 720),
                    Size::new(640, 480),
                    Size::new(320, 240),
                ],
            },
        ),
    ]
}

pub struct SimulatedCameraHost {
    shared: Arc<Mutex<SimState>>,
}

impl Default for SimulatedCameraHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCameraHost {
    pub fn new() -> Self {
        let permissions = [
            (Permission::Camera, PermissionStatus::Granted),
            (Permission::RecordAudio, PermissionStatus::Granted),
        ]
        .into_iter()
        .collect();

        Self {
            shared: Arc::new(Mutex::new(SimState {
                devices: default_devices(),
                permissions,
                external_dir: Some(PathBuf::from("/storage/emulated/0/Android/data/files")),
                mode: ResponseMode::Immediate,
                open_error: None,
                open_error_code: None,
                fail_configure: false,
                fail_encoder_prepare: false,
                fail_encoder_start: false,
                fail_repeating: false,
                next_surface: 0,
                journal: Vec::new(),
                pending_opens: VecDeque::new(),
                pending_configures: VecDeque::new(),
                opened: Vec::new(),
                readers: Vec::new(),
                live: Counters::default(),
            })),
        }
    }

    pub fn manual(self) -> Self {
        lock(&self.shared).mode = ResponseMode::Manual;
        self
    }

    pub fn with_devices(self, devices: Vec<(DeviceId, DeviceCharacteristics)>) -> Self {
        lock(&self.shared).devices = devices;
        self
    }

    pub fn with_permission(self, permission: Permission, status: PermissionStatus) -> Self {
        lock(&self.shared).permissions.insert(permission, status);
        self
    }

    pub fn with_external_dir(self, dir: Option<PathBuf>) -> Self {
        lock(&self.shared).external_dir = dir;
        self
    }

    /// Test-side handle sharing this host's state.
    pub fn controller(&self) -> SimController {
        SimController {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl CameraHost for SimulatedCameraHost {
    fn camera_id_list(&self) -> Result<Vec<DeviceId>, HostError> {
        Ok(lock(&self.shared)
            .devices
            .iter()
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn characteristics(&self, id: &DeviceId) -> Result<DeviceCharacteristics, HostError> {
        lock(&self.shared)
            .devices
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, characteristics)| characteristics.clone())
            .ok_or_else(|| HostError::Access(format!("unknown camera {id}")))
    }

    fn check_permission(&self, permission: Permission) -> PermissionStatus {
        lock(&self.shared)
            .permissions
            .get(&permission)
            .copied()
            .unwrap_or(PermissionStatus::NotDetermined)
    }

    fn request_permissions(&mut self, permissions: &[Permission], _request_code: u32) {
        lock(&self.shared)
            .journal
            .push(HostOp::PermissionsRequested(permissions.to_vec()));
    }

    fn open_device(&mut self, id: &DeviceId, callback: DeviceCallback) -> Result<(), HostError> {
        let (mode, error_code) = {
            let mut state = lock(&self.shared);
            state.journal.push(HostOp::OpenRequested(id.clone()));
            if let Some(err) = state.open_error.take() {
                return Err(err);
            }
            (state.mode, state.open_error_code.take())
        };

        match (mode, error_code) {
            (_, Some(code)) => callback.on_error(code),
            (ResponseMode::Immediate, None) => {
                let device = SimDevice::open(&self.shared, id.clone(), callback.clone());
                callback.on_opened(device);
            }
            (ResponseMode::Manual, None) => {
                lock(&self.shared)
                    .pending_opens
                    .push_back((id.clone(), callback));
            }
        }
        Ok(())
    }

    fn create_preview_surface(&mut self, size: Size) -> Result<Box<dyn SurfaceSink>, HostError> {
        let mut state = lock(&self.shared);
        let surface = state.allocate_surface();
        state.journal.push(HostOp::PreviewSurfaceCreated(surface, size));
        state.live.surfaces += 1;
        Ok(Box::new(SimSurface {
            surface,
            shared: Arc::clone(&self.shared),
            released: false,
        }))
    }

    fn create_image_reader(
        &mut self,
        size: Size,
        format: ImageFormat,
        max_images: u32,
        listener: ImageAvailableListener,
    ) -> Result<Box<dyn SurfaceSink>, HostError> {
        let mut state = lock(&self.shared);
        let surface = state.allocate_surface();
        state.journal.push(HostOp::ImageReaderCreated {
            surface,
            size,
            format,
            max_images,
        });
        state.readers.push((surface, listener));
        state.live.surfaces += 1;
        Ok(Box::new(SimSurface {
            surface,
            shared: Arc::clone(&self.shared),
            released: false,
        }))
    }

    fn create_encoder(&mut self) -> Result<Box<dyn EncoderSink>, HostError> {
        lock(&self.shared).live.encoders += 1;
        Ok(Box::new(SimEncoder {
            shared: Arc::clone(&self.shared),
            input_surface: None,
            released: false,
        }))
    }

    fn external_files_dir(&self) -> Option<PathBuf> {
        lock(&self.shared).external_dir.clone()
    }
}

struct SimDevice {
    id: DeviceId,
    shared: Arc<Mutex<SimState>>,
    closed: bool,
}

impl SimDevice {
    fn open(
        shared: &Arc<Mutex<SimState>>,
        id: DeviceId,
        callback: DeviceCallback,
    ) -> Box<dyn DeviceHandle> {
        let mut state = lock(shared);
        state.live.devices += 1;
        state.opened.push(callback);
        Box::new(SimDevice {
            id,
            shared: Arc::clone(shared),
            closed: false,
        })
    }
}

impl DeviceHandle for SimDevice {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn create_capture_session(
        &mut self,
        targets: &[SurfaceId],
        callback: SessionCallback,
    ) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::IllegalState("camera device closed".into()));
        }
        let (mode, fail) = {
            let mut state = lock(&self.shared);
            state.journal.push(HostOp::SessionRequested(targets.to_vec()));
            (state.mode, state.fail_configure)
        };

        match (mode, fail) {
            (ResponseMode::Manual, _) => {
                lock(&self.shared).pending_configures.push_back(callback);
            }
            (ResponseMode::Immediate, true) => callback.on_configure_failed(),
            (ResponseMode::Immediate, false) => {
                callback.on_configured(SimSession::open(&self.shared));
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut state = lock(&self.shared);
        state.live.devices -= 1;
        state.journal.push(HostOp::DeviceClosed(self.id.clone()));
    }
}

struct SimSession {
    shared: Arc<Mutex<SimState>>,
    closed: bool,
}

impl SimSession {
    fn open(shared: &Arc<Mutex<SimState>>) -> Box<dyn CaptureSessionHandle> {
        lock(shared).live.sessions += 1;
        Box::new(SimSession {
            shared: Arc::clone(shared),
            closed: false,
        })
    }
}

impl CaptureSessionHandle for SimSession {
    fn set_repeating_request(&mut self, request: &CaptureRequest) -> Result<(), HostError> {
        let mut state = lock(&self.shared);
        if state.fail_repeating {
            return Err(HostError::Access("camera in use by another client".into()));
        }
        state.journal.push(HostOp::RepeatingRequest(request.clone()));
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut state = lock(&self.shared);
        state.live.sessions -= 1;
        state.journal.push(HostOp::SessionClosed);
    }
}

// Sessions dropped without close (device lost) still count as gone.
impl Drop for SimSession {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            lock(&self.shared).live.sessions -= 1;
        }
    }
}

struct SimSurface {
    surface: SurfaceId,
    shared: Arc<Mutex<SimState>>,
    released: bool,
}

impl SurfaceSink for SimSurface {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut state = lock(&self.shared);
        state.live.surfaces -= 1;
        state.readers.retain(|(surface, _)| *surface != self.surface);
        state.journal.push(HostOp::SurfaceReleased(self.surface));
    }
}

struct SimEncoder {
    shared: Arc<Mutex<SimState>>,
    input_surface: Option<SurfaceId>,
    released: bool,
}

impl EncoderSink for SimEncoder {
    fn configure(&mut self, settings: &EncoderSettings) -> Result<(), HostError> {
        lock(&self.shared)
            .journal
            .push(HostOp::EncoderConfigured(settings.clone()));
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), HostError> {
        let mut state = lock(&self.shared);
        if state.fail_encoder_prepare {
            return Err(HostError::Io("output file not writable".into()));
        }
        let surface = state.allocate_surface();
        state.journal.push(HostOp::EncoderPrepared(surface));
        self.input_surface = Some(surface);
        Ok(())
    }

    fn input_surface(&self) -> Option<SurfaceId> {
        self.input_surface
    }

    fn start(&mut self) -> Result<(), HostError> {
        let mut state = lock(&self.shared);
        if state.fail_encoder_start {
            return Err(HostError::IllegalState("encoder start failed".into()));
        }
        state.journal.push(HostOp::EncoderStarted);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HostError> {
        lock(&self.shared).journal.push(HostOp::EncoderStopped);
        Ok(())
    }

    fn reset(&mut self) {
        lock(&self.shared).journal.push(HostOp::EncoderReset);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut state = lock(&self.shared);
        state.live.encoders -= 1;
        state.journal.push(HostOp::EncoderReleased);
    }
}

struct SimImageReader {
    pending: Option<SimImage>,
}

impl ImageReader for SimImageReader {
    fn acquire_latest_image(&mut self) -> Option<Box<dyn AcquiredImage>> {
        self.pending
            .take()
            .map(|image| Box::new(image) as Box<dyn AcquiredImage>)
    }
}

struct SimImage {
    width: u32,
    height: u32,
    timestamp_ns: i64,
}

impl AcquiredImage for SimImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    fn close(self: Box<Self>) {}
}

/// Test-side control of a [`SimulatedCameraHost`].
#[derive(Clone)]
pub struct SimController {
    shared: Arc<Mutex<SimState>>,
}

impl SimController {
    pub fn journal(&self) -> Vec<HostOp> {
        lock(&self.shared).journal.clone()
    }

    pub fn clear_journal(&self) {
        lock(&self.shared).journal.clear();
    }

    /// Open devices, sessions, surfaces and encoders not yet released.
    pub fn live_handles(&self) -> usize {
        let state = lock(&self.shared);
        state.live.devices + state.live.sessions + state.live.surfaces + state.live.encoders
    }

    pub fn open_devices(&self) -> usize {
        lock(&self.shared).live.devices
    }

    pub fn pending_opens(&self) -> usize {
        lock(&self.shared).pending_opens.len()
    }

    pub fn set_permission(&self, permission: Permission, status: PermissionStatus) {
        lock(&self.shared).permissions.insert(permission, status);
    }

    /// Make the next `open_device` call fail synchronously.
    pub fn fail_next_open_call(&self, err: HostError) {
        lock(&self.shared).open_error = Some(err);
    }

    /// Make the next open report `on_error(code)` instead of opening.
    pub fn fail_next_open_async(&self, code: i32) {
        lock(&self.shared).open_error_code = Some(code);
    }

    pub fn set_fail_configure(&self, fail: bool) {
        lock(&self.shared).fail_configure = fail;
    }

    pub fn set_fail_encoder_prepare(&self, fail: bool) {
        lock(&self.shared).fail_encoder_prepare = fail;
    }

    pub fn set_fail_encoder_start(&self, fail: bool) {
        lock(&self.shared).fail_encoder_start = fail;
    }

    pub fn set_fail_repeating_request(&self, fail: bool) {
        lock(&self.shared).fail_repeating = fail;
    }

    /// Resolve the oldest pending open successfully.
    pub fn complete_open(&self) -> bool {
        let pending = lock(&self.shared).pending_opens.pop_front();
        match pending {
            Some((id, callback)) => {
                let device = SimDevice::open(&self.shared, id, callback.clone());
                callback.on_opened(device);
                true
            }
            None => false,
        }
    }

    /// Resolve the oldest pending open with a device error.
    pub fn reject_open(&self, code: i32) -> bool {
        let pending = lock(&self.shared).pending_opens.pop_front();
        match pending {
            Some((_, callback)) => {
                callback.on_error(code);
                true
            }
            None => false,
        }
    }

    /// Resolve the oldest pending open with a disconnect.
    pub fn disconnect_pending(&self) -> bool {
        let pending = lock(&self.shared).pending_opens.pop_front();
        match pending {
            Some((_, callback)) => {
                callback.on_disconnected();
                true
            }
            None => false,
        }
    }

    pub fn complete_configure(&self) -> bool {
        let pending = lock(&self.shared).pending_configures.pop_front();
        match pending {
            Some(callback) => {
                callback.on_configured(SimSession::open(&self.shared));
                true
            }
            None => false,
        }
    }

    pub fn reject_configure(&self) -> bool {
        let pending = lock(&self.shared).pending_configures.pop_front();
        match pending {
            Some(callback) => {
                callback.on_configure_failed();
                true
            }
            None => false,
        }
    }

    fn opened_callback(&self, index: Option<usize>) -> Option<DeviceCallback> {
        let state = lock(&self.shared);
        match index {
            Some(index) => state.opened.get(index).cloned(),
            None => state.opened.last().cloned(),
        }
    }

    /// Report a disconnect for the most recently opened device.
    pub fn disconnect(&self) -> bool {
        match self.opened_callback(None) {
            Some(callback) => {
                callback.on_disconnected();
                true
            }
            None => false,
        }
    }

    pub fn device_error(&self, code: i32) -> bool {
        self.device_error_at(None, code)
    }

    /// Report a device error through the callback of the `index`-th opened
    /// device (oldest first), or the newest one.
    pub fn device_error_at(&self, index: Option<usize>, code: i32) -> bool {
        match self.opened_callback(index) {
            Some(callback) => {
                callback.on_error(code);
                true
            }
            None => false,
        }
    }

    /// Deliver one frame to every live image reader. Returns how many
    /// readers received it.
    pub fn emit_frame(&self, width: u32, height: u32, timestamp_ns: i64) -> usize {
        let listeners: Vec<ImageAvailableListener> = lock(&self.shared)
            .readers
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            let mut reader = SimImageReader {
                pending: Some(SimImage {
                    width,
                    height,
                    timestamp_ns,
                }),
            };
            listener(&mut reader);
        }
        listeners.len()
    }
}
