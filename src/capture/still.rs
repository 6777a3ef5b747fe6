//! Pi camera driven through `raspistill` / `libcamera-still`.
//!
//! With the preview running the driver is kept alive in signal mode: the
//! sensor stays up, and every `SIGUSR1` makes it write one still to a scratch
//! file which is then copied to the requested path. Without a preview each
//! capture is a separate one-shot driver invocation.

use super::{Camera, CameraError, CaptureConfig};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const FRAME_POLL: Duration = Duration::from_millis(50);

/// The Raspberry Pi camera module.
#[derive(Debug)]
pub struct StillCamera {
    config: Option<CaptureConfig>,
    driver: Option<Child>,
    scratch: PathBuf,
}

impl StillCamera {
    pub fn new() -> Self {
        let scratch =
            std::env::temp_dir().join(format!("pi-timelapse-{}.still", std::process::id()));
        Self::with_scratch_path(scratch)
    }

    /// Uses `scratch` for frames written in signal mode. Pointing it at a
    /// tmpfs spares the SD card a write per frame.
    pub fn with_scratch_path(scratch: impl Into<PathBuf>) -> Self {
        Self {
            config: None,
            driver: None,
            scratch: scratch.into(),
        }
    }

    /// Flags shared by both capture modes.
    fn common_args(config: &CaptureConfig) -> Vec<String> {
        let mut args = vec![
            "--width".to_string(),
            config.width.to_string(),
            "--height".to_string(),
            config.height.to_string(),
            "--rotation".to_string(),
            config.rotation.to_string(),
            "--encoding".to_string(),
            config.encoding.as_str().to_string(),
        ];
        if let Some(quality) = config.effective_quality() {
            args.push("--quality".to_string());
            args.push(quality.to_string());
        }
        args
    }

    /// Arguments for the long-running signal-mode driver.
    pub fn signal_mode_args(config: &CaptureConfig, scratch: &Path) -> Vec<String> {
        let mut args = Self::common_args(config);
        args.extend(["--signal".to_string(), "--timeout".to_string(), "0".to_string()]);
        if !config.preview {
            args.push("--nopreview".to_string());
        }
        args.push("--output".to_string());
        args.push(scratch.display().to_string());
        args
    }

    /// Arguments for a single capture straight into `path`.
    pub fn one_shot_args(config: &CaptureConfig, path: &Path) -> Vec<String> {
        let mut args = Self::common_args(config);
        args.extend([
            "--nopreview".to_string(),
            "--timeout".to_string(),
            config.warmup_ms.max(1).to_string(),
            "--output".to_string(),
            path.display().to_string(),
        ]);
        args
    }

    fn config(&self) -> Result<&CaptureConfig, CameraError> {
        self.config.as_ref().ok_or(CameraError::NotInitialized)
    }

    fn capture_signalled(&mut self, path: &Path) -> Result<(), CameraError> {
        let timeout = self.config()?.capture_timeout();
        let driver = self.driver.as_mut().ok_or(CameraError::NotInitialized)?;
        if let Some(status) = driver.try_wait()? {
            self.driver = None;
            return Err(driver_exited(status));
        }
        let pid = driver.id();

        match std::fs::remove_file(&self.scratch) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let status = Command::new("kill")
            .arg("-USR1")
            .arg(pid.to_string())
            .status()?;
        if !status.success() {
            return Err(CameraError::CaptureFailed(format!(
                "signalling camera driver {pid} failed with {status}"
            )));
        }

        // The driver writes to a temporary name and renames the finished
        // still into place, so existence means complete.
        let deadline = Instant::now() + timeout;
        while !self.scratch.exists() {
            if let Some(status) = driver.try_wait()? {
                self.driver = None;
                return Err(driver_exited(status));
            }
            if Instant::now() >= deadline {
                return Err(CameraError::CaptureTimeout(timeout));
            }
            std::thread::sleep(FRAME_POLL);
        }

        std::fs::copy(&self.scratch, path)?;
        Ok(())
    }

    fn capture_one_shot(&self, path: &Path) -> Result<(), CameraError> {
        let config = self.config()?;
        let output = own_process_group(&mut Command::new(&config.program))
            .args(Self::one_shot_args(config, path))
            .stdout(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(CameraError::CaptureFailed(format!(
                "{} exited with {}: {}",
                config.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Default for StillCamera {
    fn default() -> Self {
        Self::new()
    }
}

fn driver_exited(status: ExitStatus) -> CameraError {
    CameraError::CaptureFailed(format!("camera driver exited with {status}"))
}

/// Starts the driver in its own process group so a ctrl+c typed at the
/// terminal reaches only our handler, which then winds the session down.
fn own_process_group(command: &mut Command) -> &mut Command {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command
}

/// Resolves `program` against `PATH` unless it already contains a path
/// separator.
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

impl Camera for StillCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if self.config.is_some() {
            return Err(CameraError::OpenFailed("camera already open".to_string()));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        let program = find_program(&config.program)
            .ok_or_else(|| CameraError::DeviceNotFound(config.program.clone()))?;

        info!(
            program = %program.display(),
            width = config.width,
            height = config.height,
            rotation = config.rotation,
            quality = ?config.effective_quality(),
            "Starting camera..."
        );
        self.config = Some(config.clone());
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        let config = self.config()?;
        if self.driver.is_some() {
            return Ok(());
        }
        let child = own_process_group(&mut Command::new(&config.program))
            .args(Self::signal_mode_args(config, &self.scratch))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| CameraError::PreviewFailed(e.to_string()))?;
        debug!(pid = child.id(), "camera driver started in signal mode");
        self.driver = Some(child);
        Ok(())
    }

    fn stop_preview(&mut self) {
        if let Some(mut child) = self.driver.take() {
            if let Err(e) = child.kill() {
                warn!("failed to stop camera driver: {}", e);
            }
            if let Err(e) = child.wait() {
                warn!("failed to reap camera driver: {}", e);
            }
            debug!("camera driver stopped");
        }
    }

    fn capture_to(&mut self, path: &Path) -> Result<(), CameraError> {
        if self.driver.is_some() {
            self.capture_signalled(path)
        } else {
            self.capture_one_shot(path)
        }
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.stop_preview();
        if self.config.take().is_some() {
            match std::fs::remove_file(&self.scratch) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("failed to remove {}: {}", self.scratch.display(), e),
            }
            info!("Camera closed");
        }
    }
}

impl Drop for StillCamera {
    fn drop(&mut self) {
        self.close();
    }
}
