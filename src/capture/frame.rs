//! Record of a captured still.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// A still written to disk during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Where the still was written.
    path: PathBuf,
    /// Zero-based counter used in the file name.
    sequence: u64,
    /// Time since the session's capture start.
    offset: Duration,
}

impl CapturedFrame {
    pub fn new(path: PathBuf, sequence: u64, offset: Duration) -> Self {
        Self {
            path,
            sequence,
            offset,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn offset(&self) -> Duration {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_accessors() {
        let frame = CapturedFrame::new(
            PathBuf::from("time-lapse/timelapse0003.jpeg"),
            3,
            Duration::from_secs(6),
        );

        assert_eq!(frame.sequence(), 3);
        assert_eq!(frame.offset(), Duration::from_secs(6));
        assert_eq!(frame.path(), Path::new("time-lapse/timelapse0003.jpeg"));
    }
}
