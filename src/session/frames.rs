use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::platform::{ImageAvailableListener, ImageReader};
use crate::types::FrameInfo;

/// User hook for processed frames. Only ever sees a [`FrameInfo`].
pub type FrameCallback = Arc<dyn Fn(FrameInfo) + Send + Sync>;

/// Per-frame work of the frame sink: take the newest image, log it, give
/// the buffer back, and forward its description.
#[derive(Default)]
pub struct FrameDispatch {
    delivered: AtomicU64,
    callback: RwLock<Option<FrameCallback>>,
}

impl FrameDispatch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn set_callback(&self, callback: Option<FrameCallback>) {
        match self.callback.write() {
            Ok(mut slot) => *slot = callback,
            Err(poisoned) => *poisoned.into_inner() = callback,
        }
    }

    pub fn on_image_available(&self, reader: &mut dyn ImageReader) {
        let Some(image) = reader.acquire_latest_image() else {
            return;
        };

        let info = FrameInfo {
            sequence: self.delivered.fetch_add(1, Ordering::Relaxed) + 1,
            width: image.width(),
            height: image.height(),
            timestamp_ns: image.timestamp_ns(),
        };
        log::debug!("Got image: {} x {}", info.width, info.height);
        image.close();

        let callback = match self.callback.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(callback) = callback {
            callback(info);
        }
    }

    /// Listener handed to the host image reader.
    pub fn listener(self: &Arc<Self>) -> ImageAvailableListener {
        let dispatch = Arc::clone(self);
        Arc::new(move |reader: &mut dyn ImageReader| dispatch.on_image_available(reader))
    }
}
