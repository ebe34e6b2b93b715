//! Capture backends and the startup selector.
//!
//! Every variant satisfies the same lifecycle: `initialize` acquires
//! the underlying device or session (idempotently), `take_picture`
//! fails fast with [`CameraError::NotInitialized`] until it has, and a
//! successful capture resolves exactly once through the shared
//! post-processing pipeline. The selector runs once at startup; the
//! rest of the application holds a single [`CameraBackend`] value and
//! is unaware of the alternatives.

pub mod livecam;
pub mod simulated;
pub mod webcam;

pub use livecam::LivecamCamera;
pub use simulated::SimulatedCamera;
pub use webcam::WebcamCamera;

use crate::config::{BackendKind, BoothConfig};
use crate::errors::CameraError;
use crate::types::{CaptureKind, CaptureResult};

/// One concrete capture backend, chosen from configuration.
pub enum CameraBackend {
    Simulated(SimulatedCamera),
    Webcam(WebcamCamera),
    Livecam(LivecamCamera),
}

impl CameraBackend {
    /// Select the backend named by the configuration. Unknown kinds
    /// fall back to the local webcam.
    pub fn from_config(config: &BoothConfig) -> Self {
        match config.backend.kind {
            BackendKind::Simulated => CameraBackend::Simulated(SimulatedCamera::new(config)),
            BackendKind::Livecam => CameraBackend::Livecam(LivecamCamera::new(config)),
            BackendKind::Webcam => CameraBackend::Webcam(WebcamCamera::new(config)),
            BackendKind::Unknown => {
                log::warn!("unknown camera backend configured, falling back to webcam");
                CameraBackend::Webcam(WebcamCamera::new(config))
            }
        }
    }

    /// Which variant this backend is.
    pub fn kind(&self) -> BackendKind {
        match self {
            CameraBackend::Simulated(_) => BackendKind::Simulated,
            CameraBackend::Webcam(_) => BackendKind::Webcam,
            CameraBackend::Livecam(_) => BackendKind::Livecam,
        }
    }

    /// Acquire the underlying device or session.
    ///
    /// Idempotent once ready; on failure the backend stays
    /// uninitialized and the connection failure carries the cause.
    pub async fn initialize(&self) -> Result<(), CameraError> {
        match self {
            CameraBackend::Simulated(camera) => camera.initialize().await,
            CameraBackend::Webcam(camera) => camera.initialize().await,
            CameraBackend::Livecam(camera) => camera.initialize().await,
        }
    }

    pub fn is_initialized(&self) -> bool {
        match self {
            CameraBackend::Simulated(camera) => camera.is_initialized(),
            CameraBackend::Webcam(camera) => camera.is_initialized(),
            CameraBackend::Livecam(camera) => camera.is_initialized(),
        }
    }

    /// Liveness. Equal to `is_initialized` for variants without a
    /// persistent link; the streamed variant reports socket state.
    pub async fn is_connected(&self) -> bool {
        match self {
            CameraBackend::Simulated(camera) => camera.is_connected().await,
            CameraBackend::Webcam(camera) => camera.is_connected().await,
            CameraBackend::Livecam(camera) => camera.is_connected().await,
        }
    }

    /// Take a picture of the requested kind.
    ///
    /// Resolves exactly once for every request except a streamed
    /// request whose kind is already pending, which is dropped and
    /// reported as `None`.
    pub async fn take_picture(&self, kind: CaptureKind) -> Option<CaptureResult> {
        match self {
            CameraBackend::Simulated(camera) => Some(camera.take_picture(kind).await),
            CameraBackend::Webcam(camera) => Some(camera.take_picture(kind).await),
            CameraBackend::Livecam(camera) => camera.take_picture(kind).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_honors_configured_kind() {
        let mut config = BoothConfig::default();
        config.backend.kind = BackendKind::Simulated;
        assert_eq!(
            CameraBackend::from_config(&config).kind(),
            BackendKind::Simulated
        );

        config.backend.kind = BackendKind::Livecam;
        assert_eq!(
            CameraBackend::from_config(&config).kind(),
            BackendKind::Livecam
        );
    }

    #[test]
    fn test_selector_falls_back_to_webcam() {
        let mut config = BoothConfig::default();
        config.backend.kind = BackendKind::Unknown;
        assert_eq!(
            CameraBackend::from_config(&config).kind(),
            BackendKind::Webcam
        );
    }
}
