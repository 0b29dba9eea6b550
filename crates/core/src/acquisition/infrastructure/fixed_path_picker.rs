use std::path::PathBuf;

use crate::acquisition::domain::file_picker::FilePicker;

/// Picks a path decided up front, e.g. from the command line. Picks once.
pub struct FixedPathPicker {
    path: Option<PathBuf>,
}

impl FixedPathPicker {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }
}

impl FilePicker for FixedPathPicker {
    fn pick(&mut self) -> Option<PathBuf> {
        self.path.take()
    }
}
