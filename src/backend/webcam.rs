//! Local-device backend: a USB webcam driven through nokhwa.
//!
//! `initialize` opens a session at the configured device index and
//! resolution; `take_picture` polls a single frame, JPEG-encodes it
//! and hands it to the resizing pipeline. A device-level capture
//! failure discards the session handle so the next `initialize` is
//! forced to reacquire the device instead of reusing a broken handle.

use crate::config::{BoothConfig, WebcamConfig};
use crate::errors::CameraError;
use crate::pipeline::PhotoPipeline;
use crate::sample::take_sample_picture;
use crate::types::{timestamp, CaptureKind, CaptureOutput};
use image::codecs::jpeg::JpegEncoder;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    CallbackCamera,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct WebcamCamera {
    config: WebcamConfig,
    pipeline: PhotoPipeline,
    session: Arc<Mutex<Option<CallbackCamera>>>,
    /// Ready flag for simulate mode, where no session is ever opened.
    simulated: AtomicBool,
}

impl WebcamCamera {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            config: config.webcam.clone(),
            pipeline: PhotoPipeline::resizing(config),
            session: Arc::new(Mutex::new(None)),
            simulated: AtomicBool::new(false),
        }
    }

    /// Configure device parameters and open the session handle.
    ///
    /// Idempotent while a session is held: reports success without
    /// touching the device again.
    pub async fn initialize(&self) -> Result<(), CameraError> {
        if self.is_initialized() {
            log::info!("camera already initialized");
            return Ok(());
        }
        if self.config.simulate {
            log::info!("webcam in simulate mode, skipping device acquisition");
            return self.mark_simulated();
        }

        let config = self.config.clone();
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || {
            let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                nokhwa::utils::CameraFormat::new(
                    Resolution::new(config.resolution[0], config.resolution[1]),
                    FrameFormat::MJPEG,
                    config.fps,
                ),
            ));

            let mut camera =
                CallbackCamera::new(CameraIndex::Index(config.device_index), requested, |_| {})
                    .map_err(|e| CameraError::ConnectionFailed(e.to_string()))?;
            camera
                .open_stream()
                .map_err(|e| CameraError::ConnectionFailed(e.to_string()))?;

            log::info!("webcam {} initialized", config.device_index);
            let mut guard = session
                .lock()
                .map_err(|_| CameraError::ConnectionFailed("camera lock poisoned".to_string()))?;
            *guard = Some(camera);
            Ok(())
        })
        .await
        .map_err(|e| CameraError::ConnectionFailed(format!("init task failed: {}", e)))?
    }

    pub fn is_initialized(&self) -> bool {
        if self.config.simulate {
            return self.simulated_ready();
        }
        self.session.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    pub async fn is_connected(&self) -> bool {
        self.is_initialized()
    }

    pub async fn take_picture(&self, kind: CaptureKind) -> Result<CaptureOutput, CameraError> {
        if !self.is_initialized() {
            return Err(CameraError::NotInitialized);
        }
        if self.config.simulate {
            return take_sample_picture(&self.pipeline, kind)
                .await
                .map(CaptureOutput::Saved);
        }

        let filename = kind.filename(&timestamp());
        let data = self.capture_jpeg().await?;
        self.pipeline
            .process(data, &filename)
            .await
            .map(CaptureOutput::Saved)
    }

    /// Poll one frame off the open session and JPEG-encode it.
    ///
    /// On device failure the session handle is dropped; with
    /// `keep_open = false` it is also released after success.
    async fn capture_jpeg(&self) -> Result<Vec<u8>, CameraError> {
        let session = self.session.clone();
        let keep_open = self.config.keep_open;
        let quality = self.pipeline.jpeg_quality();

        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|_| CameraError::CaptureFailed("camera lock poisoned".to_string()))?;
            let camera = guard.as_mut().ok_or(CameraError::NotInitialized)?;

            let frame = match camera.poll_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    // Broken handle; force the next initialize to reopen.
                    *guard = None;
                    return Err(CameraError::CaptureFailed(e.to_string()));
                }
            };

            let out = transcode_frame(&frame, quality)?;

            if !keep_open {
                if let Some(mut camera) = guard.take() {
                    let _ = camera.stop_stream();
                    log::debug!("released webcam session after capture");
                }
            }

            Ok(out)
        })
        .await
        .map_err(|e| CameraError::CaptureFailed(format!("capture task failed: {}", e)))?
    }

    fn mark_simulated(&self) -> Result<(), CameraError> {
        self.simulated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn simulated_ready(&self) -> bool {
        self.simulated.load(Ordering::SeqCst)
    }
}

/// Decode a polled frame from its negotiated source format (MJPEG,
/// YUYV, ...) and re-encode it as JPEG for the pipeline.
fn transcode_frame(frame: &nokhwa::Buffer, quality: u8) -> Result<Vec<u8>, CameraError> {
    let decoded = frame
        .decode_image::<RgbFormat>()
        .map_err(|e| CameraError::CaptureFailed(format!("frame decode failed: {}", e)))?;

    let (width, height) = (decoded.width(), decoded.height());
    let img = image::RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
        CameraError::CaptureFailed("decoded frame does not match resolution".to_string())
    })?;

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(encoder)
        .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn jpeg_payload(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 90, 160]));
        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, 90);
        image::DynamicImage::ImageRgb8(img)
            .write_with_encoder(encoder)
            .unwrap();
        out
    }

    #[test]
    fn test_transcode_decodes_compressed_source_frames() {
        let payload = jpeg_payload(64, 48);
        // A compressed frame is much shorter than width * height * 3;
        // the buffer must be decoded, never reinterpreted as raw RGB.
        assert!(payload.len() < 64 * 48 * 3);

        let frame = nokhwa::Buffer::new(Resolution::new(64, 48), &payload, FrameFormat::MJPEG);
        let data = transcode_frame(&frame, 90).unwrap();

        let img = image::load_from_memory(&data).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn test_transcode_rejects_undecodable_frames() {
        let frame = nokhwa::Buffer::new(Resolution::new(64, 48), &[0u8; 32], FrameFormat::MJPEG);
        let err = transcode_frame(&frame, 90).unwrap_err();
        assert_eq!(err.status_code(), -2);
    }
}
