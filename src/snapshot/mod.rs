//! Quick snapshot: a fixed burst of stills turned into an animated GIF.

mod animation;

pub use animation::{AnimationOutcome, AnimationTool};

use crate::capture::{Camera, CameraGuard, CaptureConfig, OutputDir, SessionError, SnapshotConfig};
use crate::timing::CancelToken;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of a snapshot run.
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    pub frames: Vec<PathBuf>,
    /// `None` when animation was disabled or the run was cancelled.
    pub animation: Option<AnimationOutcome>,
    pub cancelled: bool,
}

/// Captures `count` stills back to back at default settings.
#[derive(Debug, Clone)]
pub struct Snapshot {
    config: SnapshotConfig,
    capture: CaptureConfig,
}

impl Snapshot {
    pub fn new(config: SnapshotConfig, capture: CaptureConfig) -> Self {
        Self { config, capture }
    }

    pub fn run<C: Camera + ?Sized>(
        &self,
        camera: &mut C,
        cancel: &CancelToken,
    ) -> Result<SnapshotReport, SessionError> {
        let output = OutputDir::ensure(&self.config.output)?;
        let mut frames = Vec::with_capacity(self.config.count as usize);

        {
            let mut camera = CameraGuard::open(camera, &self.capture)?;
            for i in 0..u64::from(self.config.count) {
                if cancel.is_cancelled() {
                    break;
                }
                let path = output.frame_path(i);
                if let Err(e) = camera.capture_to(&path) {
                    if cancel.is_cancelled() {
                        debug!("capture interrupted: {}", e);
                        break;
                    }
                    return Err(e.into());
                }
                info!("Captured {}", path.display());
                frames.push(path);
            }
        }

        if cancel.is_cancelled() {
            info!("Exit via user input");
            return Ok(SnapshotReport {
                frames,
                animation: None,
                cancelled: true,
            });
        }

        let animation = self
            .config
            .animate
            .then(|| AnimationTool::from_config(&self.config).run(&frames));
        info!("done");
        Ok(SnapshotReport {
            frames,
            animation,
            cancelled: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MockCamera, OutputConfig};

    fn config(dir: &std::path::Path) -> SnapshotConfig {
        SnapshotConfig {
            output: OutputConfig {
                directory: dir.join("images"),
                prefix: "image".to_string(),
                extension: "jpg".to_string(),
            },
            animate: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_captures_ten_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let mut camera = MockCamera::new();
        let snapshot = Snapshot::new(config(tmp.path()), CaptureConfig::default());

        let report = snapshot.run(&mut camera, &CancelToken::new()).unwrap();

        assert_eq!(report.frames.len(), 10);
        assert_eq!(report.frames[9], tmp.path().join("images").join("image0009.jpg"));
        assert!(report.frames.iter().all(|f| f.exists()));
        assert_eq!(report.animation, None);
        assert_eq!(camera.open_count(), 1);
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn test_cancel_skips_animation() {
        let tmp = tempfile::tempdir().unwrap();
        let token = CancelToken::new();
        let mut camera = MockCamera::new().cancel_after(3, token.clone());
        let mut cfg = config(tmp.path());
        cfg.animate = true;
        cfg.animation_program = "no-such-image-tool-on-this-host".to_string();

        let report = Snapshot::new(cfg, CaptureConfig::default())
            .run(&mut camera, &token)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.frames.len(), 3);
        assert_eq!(report.animation, None);
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn test_interrupted_capture_is_cancelled() {
        let tmp = tempfile::tempdir().unwrap();
        let token = CancelToken::new();
        let mut camera = MockCamera::new().interrupt_at(4, token.clone());
        let mut cfg = config(tmp.path());
        cfg.animate = true;
        cfg.animation_program = "no-such-image-tool-on-this-host".to_string();

        let report = Snapshot::new(cfg, CaptureConfig::default())
            .run(&mut camera, &token)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.frames.len(), 3);
        assert_eq!(report.animation, None);
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn test_capture_failure_without_cancel_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut camera = MockCamera::new().fail_capture_at(2);

        let result = Snapshot::new(config(tmp.path()), CaptureConfig::default())
            .run(&mut camera, &CancelToken::new());

        assert!(matches!(result, Err(SessionError::Camera(_))));
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn test_failed_animation_still_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let mut camera = MockCamera::new();
        let mut cfg = config(tmp.path());
        cfg.animate = true;
        cfg.count = 2;
        cfg.animation_program = "no-such-image-tool-on-this-host".to_string();

        let report = Snapshot::new(cfg, CaptureConfig::default())
            .run(&mut camera, &CancelToken::new())
            .unwrap();

        assert!(matches!(report.animation, Some(AnimationOutcome::Failed(_))));
        assert_eq!(report.frames.len(), 2);
    }
}
