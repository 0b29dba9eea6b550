use std::path::{Path, PathBuf};

use crate::acquisition::domain::camera::{Camera, CaptureOutcome};
use crate::acquisition::domain::image_source::{AcquisitionError, AcquisitionMode, ImageSource};
use crate::shared::constants::{CAPTURE_FILE_PREFIX, CAPTURE_FILE_SUFFIX};
use crate::shared::photo::Photo;

use super::photo_decoder;

/// Takes a new photo with a [`Camera`] and returns it upright.
///
/// Each capture gets a fresh `image*.jpg` target in `target_dir`; the file is
/// kept after decoding, like a camera roll.
pub struct CaptureSource {
    camera: Box<dyn Camera>,
    target_dir: PathBuf,
}

impl CaptureSource {
    pub fn new(camera: Box<dyn Camera>, target_dir: PathBuf) -> Self {
        Self { camera, target_dir }
    }

    /// Stores captures in the user's pictures directory, or the temp dir
    /// on systems without one.
    pub fn in_pictures_dir(camera: Box<dyn Camera>) -> Self {
        let dir = dirs::picture_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(camera, dir)
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    fn create_capture_target(&self) -> Result<PathBuf, AcquisitionError> {
        let target_err = |source| AcquisitionError::CaptureTarget {
            dir: self.target_dir.clone(),
            source,
        };
        std::fs::create_dir_all(&self.target_dir).map_err(target_err)?;
        let (_file, path) = tempfile::Builder::new()
            .prefix(CAPTURE_FILE_PREFIX)
            .suffix(CAPTURE_FILE_SUFFIX)
            .tempfile_in(&self.target_dir)
            .map_err(target_err)?
            .keep()
            .map_err(|e| target_err(e.error))?;
        Ok(path)
    }
}

impl ImageSource for CaptureSource {
    fn mode(&self) -> AcquisitionMode {
        AcquisitionMode::Capture
    }

    fn acquire(&mut self) -> Result<Photo, AcquisitionError> {
        let target = self.create_capture_target()?;
        log::debug!("Capture target: {}", target.display());

        let outcome = self
            .camera
            .capture(&target)
            .map_err(AcquisitionError::Camera);
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                discard(&target);
                return Err(e);
            }
        };

        // A camera that exits without writing anything was backed out of.
        let empty = std::fs::metadata(&target)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        if outcome == CaptureOutcome::Cancelled || empty {
            discard(&target);
            return Err(AcquisitionError::Cancelled);
        }

        let (photo, rotation) = photo_decoder::decode_file(&target)?;
        if rotation.degrees() > 0 {
            log::info!("Rotating captured photo by {} degrees", rotation.degrees());
        }
        Ok(rotation.apply(photo))
    }
}

fn discard(target: &Path) {
    if let Err(e) = std::fs::remove_file(target) {
        log::debug!("Could not remove capture target {}: {e}", target.display());
    }
}
