//! Camera, output and session configuration.
//!
//! Every section of the TOML file is optional and falls back to the values
//! the Pi camera scripts have always used: 720p JPEGs rotated 270 degrees,
//! one hour of capture for a one minute 30fps movie.

use crate::schedule::{Schedule, ScheduleError};
use crate::start::StartTimeArgs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Still image encoding passed to the camera driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Jpeg,
    Png,
    Bmp,
    Gif,
}

impl Encoding {
    /// Value for the driver's `--encoding` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Jpeg => "jpg",
            Encoding::Png => "png",
            Encoding::Bmp => "bmp",
            Encoding::Gif => "gif",
        }
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, Encoding::Jpeg)
    }
}

/// Configuration for the camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Image rotation in degrees (0, 90, 180 or 270).
    pub rotation: u16,
    /// Still quality, 1 to 100. Only used for lossy encodings.
    pub quality: u8,
    pub encoding: Encoding,
    /// Show the preview window while the sensor runs.
    pub preview: bool,
    /// Sensor settling time after the preview starts.
    pub warmup_ms: u64,
    /// Camera driver executable (`raspistill` or `libcamera-still`).
    pub program: String,
    /// Longest wait for a single frame to be written.
    pub capture_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            rotation: 270,
            quality: 85,
            encoding: Encoding::Jpeg,
            preview: true,
            warmup_ms: 2000,
            program: "raspistill".to_string(),
            capture_timeout_ms: 10_000,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Quality to hand to the driver, if the encoding uses one.
    pub fn effective_quality(&self) -> Option<u8> {
        self.encoding.is_lossy().then_some(self.quality)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::InvalidQuality(self.quality));
        }
        if !matches!(self.rotation, 0 | 90 | 180 | 270) {
            return Err(ConfigError::InvalidRotation(self.rotation));
        }
        if self.program.trim().is_empty() {
            return Err(ConfigError::MissingProgram);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    #[error("invalid rotation {0} (must be 0, 90, 180 or 270)")]
    InvalidRotation(u16),
    #[error("no camera program configured")]
    MissingProgram,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub camera: CaptureConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub start: StartTimeArgs,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Human-facing schedule inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// How long to record, in hours.
    pub capture_hours: f64,
    /// Length of the resulting movie, in seconds.
    pub movie_seconds: u32,
    /// Playback framerate of the resulting movie.
    pub framerate: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            capture_hours: 1.0,
            movie_seconds: 60,
            framerate: 30,
        }
    }
}

impl ScheduleConfig {
    pub fn compute(&self) -> Result<Schedule, ScheduleError> {
        Schedule::compute(self.capture_hours, self.movie_seconds, self.framerate)
    }
}

/// Where and how frames are written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, relative to the working directory.
    pub directory: PathBuf,
    /// File name prefix before the zero-padded counter.
    pub prefix: String,
    /// File extension, without the dot.
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("time-lapse"),
            prefix: "timelapse".to_string(),
            extension: "jpeg".to_string(),
        }
    }
}

/// Quick-snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Number of frames to capture.
    pub count: u32,
    pub output: OutputConfig,
    /// Assemble the frames into an animation afterwards.
    pub animate: bool,
    /// Image tool used for the animation (ImageMagick).
    pub animation_program: String,
    /// Animated GIF written next to the frames directory.
    pub animation_path: PathBuf,
    /// Delay between animation frames, in hundredths of a second.
    pub animation_delay: u32,
    /// Animation loop count, 0 loops forever.
    pub animation_loop: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            count: 10,
            output: OutputConfig {
                directory: PathBuf::from("images"),
                prefix: "image".to_string(),
                extension: "jpg".to_string(),
            },
            animate: true,
            animation_program: "convert".to_string(),
            animation_path: PathBuf::from("animation.gif"),
            animation_delay: 10,
            animation_loop: 0,
        }
    }
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.camera.validate()?;
        Ok(config)
    }
}
