//! Camera abstraction for still capture.
//!
//! This module provides a trait-based abstraction over the camera driver,
//! allowing for both the real Pi camera and mock implementations for testing.

use super::CaptureConfig;
use crate::timing::CancelToken;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera program not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to start preview: {0}")]
    PreviewFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("timed out after {0:?} waiting for frame")]
    CaptureTimeout(Duration),
    #[error("camera not initialized")]
    NotInitialized,
    #[error("camera I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for camera implementations.
///
/// A camera is opened once per session, captures any number of stills into
/// caller-chosen files and is closed exactly once. Use
/// [`CameraGuard`](super::CameraGuard) rather than calling `close` by hand.
pub trait Camera {
    /// Opens the camera and applies resolution, rotation and quality.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Starts the sensor streaming to the preview.
    fn start_preview(&mut self) -> Result<(), CameraError>;

    /// Stops the preview. No-op if it is not running.
    fn stop_preview(&mut self);

    /// Captures a single still into `path`, overwriting any existing file.
    fn capture_to(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        (**self).open(config)
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        (**self).start_preview()
    }

    fn stop_preview(&mut self) {
        (**self).stop_preview()
    }

    fn capture_to(&mut self, path: &Path) -> Result<(), CameraError> {
        (**self).capture_to(path)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Bytes written by [`MockCamera`] for each frame: an empty JPEG (SOI, EOI).
pub const MOCK_FRAME: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

/// Mock camera for testing and dry runs.
///
/// Records every call, writes [`MOCK_FRAME`] to each capture path and can be
/// told to fail a capture or trip a cancel token after a number of frames.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    previewing: bool,
    captured: Vec<PathBuf>,
    open_count: u32,
    close_count: u32,
    preview_starts: u32,
    fail_capture_at: Option<usize>,
    cancel_after: Option<(usize, CancelToken)>,
    interrupt_at: Option<(usize, CancelToken)>,
    skip_writes: bool,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`th capture (1-based) fail.
    pub fn fail_capture_at(mut self, n: usize) -> Self {
        self.fail_capture_at = Some(n);
        self
    }

    /// Cancels `token` right after the `n`th capture.
    pub fn cancel_after(mut self, n: usize, token: CancelToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    /// Cancels `token` and fails the `n`th capture, the way a terminal
    /// ctrl+c kills a camera driver mid-frame.
    pub fn interrupt_at(mut self, n: usize, token: CancelToken) -> Self {
        self.interrupt_at = Some((n, token));
        self
    }

    /// Records captures without touching the filesystem.
    pub fn without_writes(mut self) -> Self {
        self.skip_writes = true;
        self
    }

    pub fn captured(&self) -> &[PathBuf] {
        &self.captured
    }

    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    /// Number of times an open camera was released.
    pub fn close_count(&self) -> u32 {
        self.close_count
    }

    pub fn preview_starts(&self) -> u32 {
        self.preview_starts
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub fn config(&self) -> Option<&CaptureConfig> {
        self.config.as_ref()
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.open_count += 1;
        tracing::info!("MockCamera opened with config: {:?}", config);
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        if self.config.is_none() {
            return Err(CameraError::NotInitialized);
        }
        self.previewing = true;
        self.preview_starts += 1;
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.previewing = false;
    }

    fn capture_to(&mut self, path: &Path) -> Result<(), CameraError> {
        if self.config.is_none() {
            return Err(CameraError::NotInitialized);
        }

        let n = self.captured.len() + 1;
        if let Some((at, token)) = &self.interrupt_at {
            if n == *at {
                token.cancel();
                return Err(CameraError::CaptureFailed(
                    "camera driver exited with signal: 2 (SIGINT)".to_string(),
                ));
            }
        }
        if self.fail_capture_at == Some(n) {
            return Err(CameraError::CaptureFailed(format!("mock failure on frame {n}")));
        }
        if !self.skip_writes {
            std::fs::write(path, MOCK_FRAME)?;
        }
        self.captured.push(path.to_path_buf());

        if let Some((after, token)) = &self.cancel_after {
            if n >= *after {
                token.cancel();
            }
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            self.previewing = false;
            self.close_count += 1;
            tracing::info!("MockCamera closed");
        }
    }
}
