pub mod capture_source;
pub mod command_camera;
pub mod file_camera;
pub mod fixed_path_picker;
pub mod photo_decoder;
pub mod select_source;
