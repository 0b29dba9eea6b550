pub mod camera;
pub mod file_picker;
pub mod image_source;
pub mod rotation;
