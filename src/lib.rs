//! BoothCam: camera backend abstraction for unattended photo-booth
//! appliances.
//!
//! This crate presents one uniform capture lifecycle to the rest of
//! the appliance regardless of which physical camera is in use, and
//! turns raw captured or simulated image data into persisted,
//! appropriately sized files.
//!
//! # Features
//! - Three interchangeable backends: simulated, local USB webcam,
//!   streamed live camera
//! - Preview/capture arbitration over a live frame broadcast, with
//!   automatic reconnection
//! - Shared post-processing: optional full-resolution archival plus a
//!   width-bounded display copy with a stable web-relative path
//! - Deterministic sample pictures for development and demo mode
//!
//! # Usage
//! ```rust,no_run
//! use boothcam::{BoothConfig, CameraBackend, CaptureKind};
//!
//! # async fn run() -> Result<(), boothcam::CameraError> {
//! let config = BoothConfig::load_or_default();
//! let camera = CameraBackend::from_config(&config);
//! camera.initialize().await?;
//! if let Some(result) = camera.take_picture(CaptureKind::Full).await {
//!     println!("{:?}", result?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod broadcast;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod sample;
pub mod types;

// Re-exports for convenience
pub use backend::CameraBackend;
pub use config::{BackendKind, BoothConfig};
pub use errors::CameraError;
pub use pipeline::PhotoPipeline;
pub use types::{status_code, CaptureKind, CaptureOutput, CaptureResult, SavedPhoto};

/// Initialize logging for the camera layer.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "boothcam=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        assert_eq!(NAME, "boothcam");
        assert!(!VERSION.is_empty());
        assert!(!DESCRIPTION.is_empty());
    }
}
