//! Scoped camera ownership.

use super::{Camera, CameraError, CaptureConfig};
use std::ops::{Deref, DerefMut};

/// An open camera that is released when the guard goes out of scope.
///
/// Dropping the guard stops the preview and closes the camera on every exit
/// path, including `?` returns, cancellation and panics.
pub struct CameraGuard<'a, C: Camera + ?Sized> {
    camera: &'a mut C,
}

impl<'a, C: Camera + ?Sized> CameraGuard<'a, C> {
    /// Opens `camera` with `config`. A camera that fails to open is not
    /// guarded and is left to clean up after itself.
    pub fn open(camera: &'a mut C, config: &CaptureConfig) -> Result<Self, CameraError> {
        camera.open(config)?;
        tracing::debug!(
            width = config.width,
            height = config.height,
            rotation = config.rotation,
            "camera opened"
        );
        Ok(Self { camera })
    }
}

impl<C: Camera + ?Sized> Deref for CameraGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.camera
    }
}

impl<C: Camera + ?Sized> DerefMut for CameraGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.camera
    }
}

impl<C: Camera + ?Sized> Drop for CameraGuard<'_, C> {
    fn drop(&mut self) {
        self.camera.stop_preview();
        self.camera.close();
        tracing::debug!("camera released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockCamera;
    use std::path::Path;

    #[test]
    fn test_guard_closes_on_scope_exit() {
        let mut camera = MockCamera::new().without_writes();
        {
            let mut guard = CameraGuard::open(&mut camera, &CaptureConfig::default()).unwrap();
            guard.start_preview().unwrap();
            guard.capture_to(Path::new("x.jpg")).unwrap();
            assert!(guard.is_open());
        }
        assert!(!camera.is_open());
        assert!(!camera.is_previewing());
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn test_guard_closes_on_error_path() {
        fn capture_twice(camera: &mut MockCamera) -> Result<(), CameraError> {
            let mut guard = CameraGuard::open(camera, &CaptureConfig::default())?;
            guard.capture_to(Path::new("a.jpg"))?;
            guard.capture_to(Path::new("b.jpg"))?;
            Ok(())
        }

        let mut camera = MockCamera::new().without_writes().fail_capture_at(1);
        assert!(capture_twice(&mut camera).is_err());
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn test_guard_closes_on_panic() {
        let mut camera = MockCamera::new().without_writes();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = CameraGuard::open(&mut camera, &CaptureConfig::default()).unwrap();
            panic!("driver blew up");
        }));
        assert!(result.is_err());
        assert_eq!(camera.close_count(), 1);
    }

    #[test]
    fn test_failed_open_not_guarded() {
        let mut camera = MockCamera::new();
        let config = CaptureConfig {
            width: 0,
            ..Default::default()
        };
        assert!(CameraGuard::open(&mut camera, &config).is_err());
        assert_eq!(camera.close_count(), 0);
    }
}
