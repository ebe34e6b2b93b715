use std::fmt;

/// Failure taxonomy shared by every capture backend.
///
/// Each variant maps onto the numeric result code handed to downstream
/// consumers: `-1` for [`CameraError::NotInitialized`], `-2` for
/// connection and capture failures, `-3` for save and resize failures.
/// `0` is reserved for success and never appears here.
#[derive(Debug)]
pub enum CameraError {
    NotInitialized,
    ConnectionFailed(String),
    CaptureFailed(String),
    SaveFailed(String),
    ResizeFailed(String),
}

impl CameraError {
    /// Numeric result code for this failure.
    pub fn status_code(&self) -> i32 {
        match self {
            CameraError::NotInitialized => -1,
            CameraError::ConnectionFailed(_) => -2,
            CameraError::CaptureFailed(_) => -2,
            CameraError::SaveFailed(_) => -3,
            CameraError::ResizeFailed(_) => -3,
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::NotInitialized => write!(f, "camera not initialized"),
            CameraError::ConnectionFailed(msg) => write!(f, "connection to webcam failed: {}", msg),
            CameraError::CaptureFailed(msg) => write!(f, "capture failed: {}", msg),
            CameraError::SaveFailed(msg) => write!(f, "saving hq image failed: {}", msg),
            CameraError::ResizeFailed(msg) => write!(f, "resizing image failed: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}
