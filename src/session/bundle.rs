use std::path::Path;

use crate::platform::{CaptureSessionHandle, DeviceHandle, SurfaceSink};
use crate::recording::RecorderSink;
use crate::types::{Size, SurfaceId};

/// Every host handle of one capture session, owned in one place.
///
/// Release order is fixed: session, then device, then sinks. Dropping the
/// bundle releases whatever is still held.
#[derive(Default)]
pub struct CaptureSession {
    pub(crate) device: Option<Box<dyn DeviceHandle>>,
    pub(crate) session: Option<Box<dyn CaptureSessionHandle>>,
    pub(crate) preview: Option<Box<dyn SurfaceSink>>,
    pub(crate) preview_feed: Option<Box<dyn SurfaceSink>>,
    pub(crate) frame_reader: Option<Box<dyn SurfaceSink>>,
    pub(crate) recorder: Option<RecorderSink>,
    pub(crate) capture_size: Option<Size>,
}

impl CaptureSession {
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn sink_count(&self) -> usize {
        [
            self.preview.is_some(),
            self.preview_feed.is_some(),
            self.frame_reader.is_some(),
            self.recorder.is_some(),
        ]
        .iter()
        .filter(|held| **held)
        .count()
    }

    /// Device, session and sink handles currently held.
    pub fn live_handles(&self) -> usize {
        usize::from(self.has_device()) + usize::from(self.has_session()) + self.sink_count()
    }

    pub fn capture_size(&self) -> Option<Size> {
        self.capture_size
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.as_ref().is_some_and(RecorderSink::is_recording)
    }

    pub fn recording_path(&self) -> Option<&Path> {
        self.recorder.as_ref().map(RecorderSink::output_path)
    }

    /// Capture targets in the order they are handed to the host.
    pub fn targets(&self) -> Vec<SurfaceId> {
        let mut targets = Vec::with_capacity(4);
        if let Some(preview) = &self.preview {
            targets.push(preview.surface());
        }
        if let Some(feed) = &self.preview_feed {
            targets.push(feed.surface());
        }
        if let Some(reader) = &self.frame_reader {
            targets.push(reader.surface());
        }
        if let Some(recorder) = &self.recorder {
            targets.push(recorder.surface());
        }
        targets
    }

    /// Forget the session handle without closing it. Used after the device
    /// is lost, when the host has already invalidated the session.
    pub(crate) fn discard_session(&mut self) {
        if self.session.take().is_some() {
            log::debug!("Discarding capture session invalidated by the device");
        }
    }

    pub(crate) fn drop_recorder(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.release();
        }
    }

    /// Close the session, close the device, then release every sink.
    pub(crate) fn close_all(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        if let Some(mut device) = self.device.take() {
            log::debug!("Closing camera {}", device.id());
            device.close();
        }
        for mut sink in [
            self.preview.take(),
            self.preview_feed.take(),
            self.frame_reader.take(),
        ]
        .into_iter()
        .flatten()
        {
            sink.release();
        }
        self.drop_recorder();
        self.capture_size = None;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.live_handles() > 0 {
            log::warn!("Capture session dropped while holding handles, releasing");
            self.close_all();
        }
    }
}
