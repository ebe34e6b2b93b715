//! Simulated backend: no hardware, every capture is a generated
//! sample picture run through the resizing pipeline.

use crate::config::BoothConfig;
use crate::errors::CameraError;
use crate::pipeline::PhotoPipeline;
use crate::sample::take_sample_picture;
use crate::types::{CaptureKind, CaptureOutput};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct SimulatedCamera {
    pipeline: PhotoPipeline,
    initialized: AtomicBool,
}

impl SimulatedCamera {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            pipeline: PhotoPipeline::resizing(config),
            initialized: AtomicBool::new(false),
        }
    }

    /// Always succeeds; there is no device to acquire.
    pub async fn initialize(&self) -> Result<(), CameraError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            log::info!("camera already initialized");
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn is_connected(&self) -> bool {
        self.is_initialized()
    }

    pub async fn take_picture(&self, kind: CaptureKind) -> Result<CaptureOutput, CameraError> {
        if !self.is_initialized() {
            return Err(CameraError::NotInitialized);
        }
        take_sample_picture(&self.pipeline, kind)
            .await
            .map(CaptureOutput::Saved)
    }
}
