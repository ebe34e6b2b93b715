//! Core capture types shared by all backends.

use crate::errors::CameraError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Timestamp format used in capture filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Web-relative directory prefix for derived photos.
pub const WEB_PHOTOS_PREFIX: &str = "photos";

/// Current local time formatted for capture filenames.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// What a capture request is for.
///
/// Previews feed the live view and are never archived as numbered
/// files; full captures become `img_<timestamp>.jpg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    Preview,
    Full,
}

impl CaptureKind {
    pub fn is_preview(&self) -> bool {
        matches!(self, CaptureKind::Preview)
    }

    /// Filename for a capture of this kind taken at `timestamp`.
    pub fn filename(&self, timestamp: &str) -> String {
        match self {
            CaptureKind::Preview => "preview.jpg".to_string(),
            CaptureKind::Full => format!("img_{}.jpg", timestamp),
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaptureKind::Preview => write!(f, "preview"),
            CaptureKind::Full => write!(f, "capture"),
        }
    }
}

/// A capture that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPhoto {
    /// Path of the display-bound copy (or the archival copy when no
    /// resizing is configured).
    pub path: PathBuf,
    /// Web-relative path, `photos/<filename>` for resized copies.
    pub web_path: String,
}

/// Successful outcome of a capture request.
#[derive(Debug, Clone)]
pub enum CaptureOutput {
    /// Persisted photo; the named files exist before this is produced.
    Saved(SavedPhoto),
    /// Raw preview frame as it arrived off the wire, not persisted.
    Frame(Bytes),
}

/// Outcome delivered for every capture request that is not dropped.
pub type CaptureResult = Result<CaptureOutput, CameraError>;

/// Numeric result code for a capture outcome: `0` on success, the
/// error's code otherwise.
pub fn status_code(result: &CaptureResult) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.status_code(),
    }
}
