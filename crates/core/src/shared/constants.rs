/// Estimated ages at or above this many years count as adults.
pub const ADULT_AGE_THRESHOLD: f32 = 18.0;

pub const AGE_MODEL_NAME: &str = "model_age.onnx";
pub const DETECTOR_MODEL_NAME: &str = "blazeface_short_range.onnx";

/// Capture targets are named `image<random>.jpg`.
pub const CAPTURE_FILE_PREFIX: &str = "image";
pub const CAPTURE_FILE_SUFFIX: &str = ".jpg";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
