use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::photo::Photo;

/// How a photo entered the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Freshly taken by a camera; EXIF orientation is normalized.
    Capture,
    /// Chosen from existing files; pixels are used exactly as stored.
    Select,
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionMode::Capture => write!(f, "capture"),
            AcquisitionMode::Select => write!(f, "select"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("acquisition cancelled")]
    Cancelled,
    #[error("failed to create capture target in {dir}: {source}")]
    CaptureTarget {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("camera failed: {0}")]
    Camera(#[source] std::io::Error),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl AcquisitionError {
    /// Cancellation is a no-op for the caller; everything else is reported.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AcquisitionError::Cancelled)
    }
}

/// Domain interface producing one photo per call.
///
/// A failed or cancelled acquisition produces no photo and the pipeline
/// does not start.
pub trait ImageSource: Send {
    fn mode(&self) -> AcquisitionMode;

    fn acquire(&mut self) -> Result<Photo, AcquisitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_is_cancelled() {
        assert!(AcquisitionError::Cancelled.is_cancelled());
        let failed = AcquisitionError::Camera(std::io::Error::other("no device"));
        assert!(!failed.is_cancelled());
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let err = AcquisitionError::Read {
            path: PathBuf::from("/photos/a.jpg"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/photos/a.jpg"));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(AcquisitionMode::Capture.to_string(), "capture");
        assert_eq!(AcquisitionMode::Select.to_string(), "select");
    }
}
