use crate::acquisition::domain::file_picker::FilePicker;
use crate::acquisition::domain::image_source::{AcquisitionError, AcquisitionMode, ImageSource};
use crate::shared::photo::Photo;

use super::photo_decoder;

/// Loads a user-chosen file exactly as stored.
///
/// Unlike [`super::capture_source::CaptureSource`], EXIF orientation is not
/// applied here, even when the file carries it.
pub struct SelectSource {
    picker: Box<dyn FilePicker>,
}

impl SelectSource {
    pub fn new(picker: Box<dyn FilePicker>) -> Self {
        Self { picker }
    }
}

impl ImageSource for SelectSource {
    fn mode(&self) -> AcquisitionMode {
        AcquisitionMode::Select
    }

    fn acquire(&mut self) -> Result<Photo, AcquisitionError> {
        let path = self.picker.pick().ok_or(AcquisitionError::Cancelled)?;
        log::debug!("Selected {}", path.display());
        let bytes = std::fs::read(&path).map_err(|source| AcquisitionError::Read {
            path: path.clone(),
            source,
        })?;
        photo_decoder::decode_bytes(&bytes, &path)
    }
}
