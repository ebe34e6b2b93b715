//! Shared post-processing pipeline.
//!
//! Every capture ends here: the raw bytes are optionally archived at
//! full resolution, then a width-bounded display copy is derived and
//! its web-relative path computed. Backends whose captures are served
//! as-is (the streamed variant) run the pipeline in archival mode,
//! where the untouched bytes are written once and the same path is
//! reported for both slots.
//!
//! The pipeline holds no state across calls; concurrent invocations
//! for distinct filenames are safe.

use crate::config::BoothConfig;
use crate::errors::CameraError;
use crate::types::{SavedPhoto, WEB_PHOTOS_PREFIX};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PhotoPipeline {
    photos_dir: PathBuf,
    full_size_dir: PathBuf,
    printing_enabled: bool,
    /// Width bound for the derived copy; `None` switches to archival
    /// mode (no decoding, single full-size write).
    max_width: Option<u32>,
    jpeg_quality: u8,
}

impl PhotoPipeline {
    /// Pipeline that derives a width-bounded display copy.
    pub fn resizing(config: &BoothConfig) -> Self {
        Self {
            photos_dir: PathBuf::from(&config.storage.photos_dir),
            full_size_dir: PathBuf::from(&config.storage.full_size_photos_dir),
            printing_enabled: config.processing.printing_enabled,
            max_width: Some(config.processing.max_image_width),
            jpeg_quality: config.processing.jpeg_quality,
        }
    }

    /// Pipeline that archives the untouched bytes only.
    pub fn archival(config: &BoothConfig) -> Self {
        Self {
            max_width: None,
            ..Self::resizing(config)
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Persist a capture and report where it landed.
    ///
    /// Resizing mode: optionally archives the raw bytes first (printing),
    /// then decodes, bounds the width by the configured maximum without
    /// upscaling, re-encodes as JPEG into the photos directory and
    /// reports `(path, "photos/<filename>")`.
    ///
    /// Archival mode: single durable write under the full-size
    /// directory, the absolute path reported twice.
    pub async fn process(&self, data: Vec<u8>, filename: &str) -> Result<SavedPhoto, CameraError> {
        let max_width = match self.max_width {
            Some(w) => w,
            None => return self.archive(data, filename).await,
        };

        if self.printing_enabled {
            let full_path = self.full_size_dir.join(filename);
            write_durably(&self.full_size_dir, &full_path, &data)
                .await
                .map_err(|e| CameraError::SaveFailed(e.to_string()))?;
            log::info!("archived full-size image at {}", full_path.display());
        }

        let quality = self.jpeg_quality;
        let derived = tokio::task::spawn_blocking(move || resize_to_width(&data, max_width, quality))
            .await
            .map_err(|e| CameraError::ResizeFailed(format!("resize task failed: {}", e)))??;

        let path = self.photos_dir.join(filename);
        write_durably(&self.photos_dir, &path, &derived)
            .await
            .map_err(|e| CameraError::ResizeFailed(e.to_string()))?;

        let web_path = format!("{}/{}", WEB_PHOTOS_PREFIX, filename);
        log::info!("saved photo at {} ({} bytes)", path.display(), derived.len());
        Ok(SavedPhoto { path, web_path })
    }

    async fn archive(&self, data: Vec<u8>, filename: &str) -> Result<SavedPhoto, CameraError> {
        let path = self.full_size_dir.join(filename);
        write_durably(&self.full_size_dir, &path, &data)
            .await
            .map_err(|e| CameraError::SaveFailed(e.to_string()))?;

        log::info!("archived photo at {} ({} bytes)", path.display(), data.len());
        Ok(SavedPhoto {
            web_path: path.to_string_lossy().into_owned(),
            path,
        })
    }
}

/// Create the directory if needed, write the file and flush it to disk
/// before returning.
async fn write_durably(dir: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, data).await?;
    let file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
    file.sync_all().await
}

/// Decode `data`, bound its width by `max_width` preserving aspect
/// ratio (never upscale) and re-encode as JPEG.
fn resize_to_width(data: &[u8], max_width: u32, quality: u8) -> Result<Vec<u8>, CameraError> {
    let img = image::load_from_memory(data)
        .map_err(|e| CameraError::ResizeFailed(format!("decoding image failed: {}", e)))?;

    let img = if img.width() > max_width {
        img.resize(max_width, u32::MAX, FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    image::DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| CameraError::ResizeFailed(format!("encoding image failed: {}", e)))?;
    Ok(out)
}
