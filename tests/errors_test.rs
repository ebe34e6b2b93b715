#[cfg(test)]
mod error_tests {
    use boothcam::errors::CameraError;
    use std::error::Error;

    #[test]
    fn test_not_initialized_message() {
        let error = CameraError::NotInitialized;
        assert_eq!(error.to_string(), "camera not initialized");
        assert_eq!(error.status_code(), -1);
    }

    #[test]
    fn test_connection_failed() {
        let error = CameraError::ConnectionFailed("no such device".to_string());
        assert!(error.to_string().contains("connection to webcam failed"));
        assert!(error.to_string().contains("no such device"));
        assert_eq!(error.status_code(), -2);
    }

    #[test]
    fn test_capture_failed() {
        let error = CameraError::CaptureFailed("device returned no frame".to_string());
        assert!(error.to_string().contains("capture failed"));
        assert_eq!(error.status_code(), -2);
    }

    #[test]
    fn test_save_failed() {
        let error = CameraError::SaveFailed("read-only filesystem".to_string());
        assert!(error.to_string().contains("saving hq image failed"));
        assert_eq!(error.status_code(), -3);
    }

    #[test]
    fn test_resize_failed() {
        let error = CameraError::ResizeFailed("not a jpeg".to_string());
        assert!(error.to_string().contains("resizing image failed"));
        assert_eq!(error.status_code(), -3);
    }

    #[test]
    fn test_debug_format() {
        let error = CameraError::ConnectionFailed("debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("ConnectionFailed"));
        assert!(debug_str.contains("debug test"));
    }

    #[test]
    fn test_implements_error_trait() {
        let error = CameraError::CaptureFailed("error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }
}
