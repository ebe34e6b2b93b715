//! Configuration for the photo-booth camera layer.
//!
//! Loaded once from a TOML file at startup and treated as read-only
//! afterwards: backend selection, per-backend device options, storage
//! locations and post-processing settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoothConfig {
    pub backend: BackendConfig,
    pub webcam: WebcamConfig,
    pub livecam: LivecamConfig,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
}

/// Which capture backend drives the booth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
}

/// Backend variants. Unknown or missing values fall back to the local
/// webcam at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Simulated,
    Webcam,
    Livecam,
    #[serde(other)]
    Unknown,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Unknown
    }
}

/// Local USB webcam options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebcamConfig {
    /// Synthesize sample pictures instead of driving the device.
    pub simulate: bool,
    /// Device index as enumerated by the platform backend.
    pub device_index: u32,
    /// Requested capture resolution [width, height].
    pub resolution: [u32; 2],
    /// Requested frame rate.
    pub fps: u32,
    /// Keep the device session open between captures. When false the
    /// session is released after every capture and reacquired on the
    /// next initialize.
    pub keep_open: bool,
}

/// Streamed live-camera options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivecamConfig {
    /// Synthesize sample pictures instead of consuming the broadcast.
    pub simulate: bool,
    /// Address of the frame-broadcast service.
    pub broadcast_addr: String,
    /// Port of the frame-broadcast service.
    pub broadcast_port: u16,
    /// Optional command launched on initialize to start the broadcast
    /// service locally. The child is torn down with the backend.
    pub server_command: Option<String>,
}

/// Where captures land on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for display-bound (derived) photos.
    pub photos_dir: String,
    /// Directory for untouched full-resolution copies.
    pub full_size_photos_dir: String,
}

/// Post-processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Archive the untouched bytes before deriving the display copy.
    pub printing_enabled: bool,
    /// Maximum width of the derived copy in pixels.
    pub max_image_width: u32,
    /// JPEG quality (1-100) for derived and simulated images.
    pub jpeg_quality: u8,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                kind: BackendKind::Webcam,
            },
            webcam: WebcamConfig {
                simulate: false,
                device_index: 0,
                resolution: [1280, 720],
                fps: 30,
                keep_open: true,
            },
            livecam: LivecamConfig {
                simulate: false,
                broadcast_addr: "127.0.0.1".to_string(),
                broadcast_port: 12000,
                server_command: None,
            },
            storage: StorageConfig {
                photos_dir: "photos".to_string(),
                full_size_photos_dir: "full_size_photos".to_string(),
            },
            processing: ProcessingConfig {
                printing_enabled: false,
                max_image_width: 1500,
                jpeg_quality: 90,
            },
        }
    }
}

impl BoothConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file: {}", e))?;

        let config: BoothConfig = toml::from_str(&contents)
            .map_err(|e| format!("failed to parse config file: {}", e))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create config directory: {}", e))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize config: {}", e))?;

        fs::write(path, toml_string)
            .map_err(|e| format!("failed to write config file: {}", e))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("boothcam.toml")
    }

    /// Load from the default location or fall back to defaults.
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.webcam.resolution[0] == 0 || self.webcam.resolution[1] == 0 {
            return Err("Invalid webcam resolution".to_string());
        }
        if self.webcam.fps == 0 || self.webcam.fps > 240 {
            return Err("Invalid webcam FPS (must be 1-240)".to_string());
        }

        if self.livecam.broadcast_addr.is_empty() {
            return Err("Broadcast address must not be empty".to_string());
        }
        if self.livecam.broadcast_port == 0 {
            return Err("Broadcast port must not be zero".to_string());
        }

        if self.storage.photos_dir.is_empty() || self.storage.full_size_photos_dir.is_empty() {
            return Err("Storage directories must not be empty".to_string());
        }

        if self.processing.max_image_width == 0 {
            return Err("Maximum image width must not be zero".to_string());
        }
        if self.processing.jpeg_quality == 0 || self.processing.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BoothConfig::default();
        assert_eq!(config.backend.kind, BackendKind::Webcam);
        assert_eq!(config.processing.max_image_width, 1500);
        assert_eq!(config.livecam.broadcast_port, 12000);
        assert!(!config.processing.printing_enabled);
    }

    #[test]
    fn test_config_validation() {
        let config = BoothConfig::default();
        assert!(config.validate().is_ok());

        let mut bad_config = config.clone();
        bad_config.webcam.resolution = [0, 0];
        assert!(bad_config.validate().is_err());

        let mut bad_port = BoothConfig::default();
        bad_port.livecam.broadcast_port = 0;
        assert!(bad_port.validate().is_err());

        let mut bad_width = BoothConfig::default();
        bad_width.processing.max_image_width = 0;
        assert!(bad_width.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = std::env::temp_dir();
        let config_path = temp_dir.join("test_boothcam.toml");

        let _ = fs::remove_file(&config_path);

        let mut config = BoothConfig::default();
        config.backend.kind = BackendKind::Livecam;
        config.livecam.broadcast_port = 12345;
        assert!(config.save_to_file(&config_path).is_ok());

        let loaded = BoothConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.backend.kind, BackendKind::Livecam);
        assert_eq!(loaded.livecam.broadcast_port, 12345);

        let _ = fs::remove_file(&config_path);
    }

    #[test]
    fn test_unknown_backend_kind_parses() {
        let mut config = BoothConfig::default();
        config.backend.kind = BackendKind::Simulated;
        let mut toml_string = toml::to_string_pretty(&config).unwrap();
        toml_string = toml_string.replace("kind = \"simulated\"", "kind = \"gphoto2\"");

        let parsed: BoothConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.backend.kind, BackendKind::Unknown);
    }

    #[test]
    fn test_missing_backend_kind_defaults_to_unknown() {
        let parsed: BackendConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.kind, BackendKind::Unknown);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = BoothConfig::load_from_file("nonexistent_file.toml");
        assert!(result.is_ok()); // Should return default
        assert_eq!(result.unwrap().processing.max_image_width, 1500);
    }
}
