//! Capture session lifecycle
//!
//! `Idle -> Opening -> Configuring -> Active -> Stopping -> Idle`, with
//! `Failed` reachable from the three busy states. The [`Lifecycle`] owns the
//! single [`CaptureSession`] bundle and is the only code that touches host
//! handles.

mod bundle;
mod frames;
mod lifecycle;
mod request;
mod state;

pub use bundle::CaptureSession;
pub use frames::{FrameCallback, FrameDispatch};
pub use lifecycle::{HostEventReceiver, Lifecycle, LifecycleEvent};
pub use request::SessionRequest;
pub use state::{SessionState, Transition};

#[cfg(test)]
mod tests;
