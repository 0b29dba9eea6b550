use std::path::PathBuf;

/// Lets the user choose an existing image file. `None` means cancelled.
pub trait FilePicker: Send {
    fn pick(&mut self) -> Option<PathBuf>;
}
