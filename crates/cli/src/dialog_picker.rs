use std::path::PathBuf;

use agetally_core::acquisition::domain::file_picker::FilePicker;
use agetally_core::shared::constants::IMAGE_EXTENSIONS;

/// Native open-file dialog filtered to image files. Closing it cancels.
pub struct DialogFilePicker;

impl FilePicker for DialogFilePicker {
    fn pick(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select a photo")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
    }
}
