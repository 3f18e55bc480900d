//! Testing utilities for backgroundcam
//!
//! Simulated camera and service hosts for running the whole lifecycle
//! offline, in unit tests, integration tests and the CLI.

pub mod service_host;
pub mod simulated_host;

pub use service_host::{ServiceOp, SimulatedServiceHost};
pub use simulated_host::{default_devices, HostOp, ResponseMode, SimController, SimulatedCameraHost};
