//! Host camera contracts
//!
//! Everything the capture lifecycle needs from the operating system lives
//! behind these traits: device enumeration, asynchronous device open and
//! session negotiation, output surfaces, the frame reader and the media
//! encoder. Asynchronous results come back through the callback objects in
//! [`callbacks`], which only enqueue events for the lifecycle owner.

pub mod callbacks;

pub use callbacks::{DeviceCallback, HostEvent, SessionCallback, TaggedEvent};

use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::HostError;
use crate::permissions::{Permission, PermissionStatus};
use crate::recording::EncoderSettings;
use crate::types::{CaptureRequest, DeviceCharacteristics, DeviceId, ImageFormat, Size, SurfaceId};

/// Called by the host on its reader thread whenever a new image is available.
pub type ImageAvailableListener = Arc<dyn Fn(&mut dyn ImageReader) + Send + Sync>;

/// Camera, surface and encoder provider of the host platform.
pub trait CameraHost: Send + 'static {
    fn camera_id_list(&self) -> Result<Vec<DeviceId>, HostError>;

    fn characteristics(&self, id: &DeviceId) -> Result<DeviceCharacteristics, HostError>;

    fn check_permission(&self, permission: Permission) -> PermissionStatus;

    /// Ask the user for permissions; the answer arrives later as a
    /// [`crate::permissions::PermissionsResult`].
    fn request_permissions(&mut self, permissions: &[Permission], request_code: u32);

    /// Start opening a device. The outcome is reported through `callback`,
    /// which stays valid for the device's lifetime (disconnects and errors).
    ///
    /// A device reported through `on_disconnected` or `on_error` before
    /// `on_opened` never reaches the caller, so the adapter must close it
    /// itself.
    fn open_device(&mut self, id: &DeviceId, callback: DeviceCallback) -> Result<(), HostError>;

    fn create_preview_surface(&mut self, size: Size) -> Result<Box<dyn SurfaceSink>, HostError>;

    fn create_image_reader(
        &mut self,
        size: Size,
        format: ImageFormat,
        max_images: u32,
        listener: ImageAvailableListener,
    ) -> Result<Box<dyn SurfaceSink>, HostError>;

    fn create_encoder(&mut self) -> Result<Box<dyn EncoderSink>, HostError>;

    /// App-specific external storage, if mounted.
    fn external_files_dir(&self) -> Option<PathBuf>;
}

/// An open camera device.
pub trait DeviceHandle: Send {
    fn id(&self) -> &DeviceId;

    /// Start negotiating a session over `targets`; the outcome is reported
    /// through `callback`.
    fn create_capture_session(
        &mut self,
        targets: &[SurfaceId],
        callback: SessionCallback,
    ) -> Result<(), HostError>;

    fn close(&mut self);
}

/// A negotiated binding between a device and its output surfaces.
pub trait CaptureSessionHandle: Send {
    fn set_repeating_request(&mut self, request: &CaptureRequest) -> Result<(), HostError>;

    fn close(&mut self);
}

/// Any host surface that consumes camera frames.
pub trait SurfaceSink: Send {
    fn surface(&self) -> SurfaceId;

    fn release(&mut self);
}

/// Host media recorder. Call order: `configure`, `prepare`, `input_surface`,
/// `start`, then `stop` and `reset` on teardown.
pub trait EncoderSink: Send {
    fn configure(&mut self, settings: &EncoderSettings) -> Result<(), HostError>;

    fn prepare(&mut self) -> Result<(), HostError>;

    /// Surface the camera renders into; only available once prepared.
    fn input_surface(&self) -> Option<SurfaceId>;

    fn start(&mut self) -> Result<(), HostError>;

    fn stop(&mut self) -> Result<(), HostError>;

    fn reset(&mut self);

    fn release(&mut self);
}

/// Reader side of the frame sink, handed to the availability listener.
pub trait ImageReader {
    fn acquire_latest_image(&mut self) -> Option<Box<dyn AcquiredImage>>;
}

/// An image borrowed from the reader's buffer pool.
pub trait AcquiredImage {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn timestamp_ns(&self) -> i64;

    /// Return the buffer to the reader.
    fn close(self: Box<Self>);
}
