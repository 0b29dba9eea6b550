use std::path::{Path, PathBuf};

use crate::acquisition::domain::camera::{Camera, CaptureOutcome};

/// Stands in for a camera by copying an existing photo into the capture target.
///
/// The copy goes through the same path as a real capture, including EXIF
/// orientation correction.
pub struct FileCamera {
    photo: PathBuf,
}

impl FileCamera {
    pub fn new(photo: PathBuf) -> Self {
        Self { photo }
    }
}

impl Camera for FileCamera {
    fn capture(&mut self, target: &Path) -> std::io::Result<CaptureOutcome> {
        std::fs::copy(&self.photo, target)?;
        Ok(CaptureOutcome::Captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_photo_into_target() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("shot.jpg");
        std::fs::write(&photo, b"pixels").unwrap();
        let target = dir.path().join("image42.jpg");

        let mut camera = FileCamera::new(photo);
        assert_eq!(camera.capture(&target).unwrap(), CaptureOutcome::Captured);
        assert_eq!(std::fs::read(target).unwrap(), b"pixels");
    }

    #[test]
    fn test_missing_photo_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = FileCamera::new(dir.path().join("missing.jpg"));
        assert!(camera.capture(&dir.path().join("image1.jpg")).is_err());
    }
}
