//! backgroundcam: a background camera service over host camera APIs
//!
//! Opens the front camera, optionally renders a transparent preview overlay
//! above other apps, streams frames to a callback and records H.264/AAC MP4
//! through the host media recorder. Camera drivers, codecs and window
//! placement stay with the host; this crate chooses the capture resolution
//! and sequences the asynchronous open, configure, capture and record steps.
//!
//! # Features
//! - Aspect-first resolution selection with a fixed fallback
//! - Event-driven capture lifecycle with deterministic teardown
//! - Late host callbacks rejected by generation, their handles closed
//! - Single-owner service actor with watch/broadcast status
//! - Optional Tauri plugin (`plugin` feature)
//!
//! # Usage
//! ```rust,no_run
//! use backgroundcam::config::ServiceConfig;
//! use backgroundcam::service::CameraService;
//! use backgroundcam::session::SessionRequest;
//! use backgroundcam::testing::SimulatedCameraHost;
//! use backgroundcam::types::Size;
//!
//! # async fn run() -> Result<(), backgroundcam::CameraError> {
//! let camera = CameraService::spawn(SimulatedCameraHost::new(), ServiceConfig::default());
//! camera.start(SessionRequest::background(Size::new(320, 200))).await?;
//! camera.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! With Tauri:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(backgroundcam::commands::init(camera_host, service_host))
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```

#[cfg(feature = "plugin")]
pub mod commands;
pub mod config;
pub mod errors;
pub mod invariant_ppt;
pub mod permissions;
pub mod platform;
pub mod recording;
pub mod selector;
pub mod service;
pub mod session;
pub mod types;

// Simulated hosts for offline runs and tests
pub mod testing;

// Re-exports for convenience
pub use config::ServiceConfig;
pub use errors::{CameraError, HostError};
pub use selector::{select, AspectPolicy, FALLBACK_SIZE};
pub use service::{BackgroundCameraService, CameraService, ServiceEvent, ServiceStatus};
pub use session::{Lifecycle, SessionRequest, SessionState};
pub use types::Size;

/// Initialize logging for the camera service
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "backgroundcam=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        fallback_size: FALLBACK_SIZE,
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Capture size used when a device reports no sizes
    pub fallback_size: Size,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "backgroundcam");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
        assert_eq!(info.fallback_size, Size::new(320, 200));
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging();
        init_logging();
        assert!(std::env::var("RUST_LOG").is_ok());
    }
}
