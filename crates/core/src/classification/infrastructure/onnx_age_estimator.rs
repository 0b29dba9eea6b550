/// Age regression model run through ONNX Runtime.
///
/// The model sees the whole photo resized to 200×200 with channels scaled
/// to [0,1] and emits a single value that is the age divided by 116.
use std::path::Path;

use image::imageops::{self, FilterType};

use crate::classification::domain::age_estimator::{AgeEstimate, AgeEstimator};
use crate::shared::onnx_session;
use crate::shared::photo::Photo;

/// Model input resolution (square).
const INPUT_SIZE: u32 = 200;

/// The model regresses `age / AGE_SCALE`.
const AGE_SCALE: f32 = 116.0;

/// Tensor layout the model expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    /// `[1, H, W, 3]`, as exported from TensorFlow.
    Nhwc,
    /// `[1, 3, H, W]`.
    Nchw,
}

impl Layout {
    /// Reads the layout from the model's declared input dims (after batch).
    /// Dynamic or unreadable shapes default to NHWC.
    fn from_input_dims(dims: Option<[i64; 3]>) -> Self {
        match dims {
            Some([3, _, _]) => Layout::Nchw,
            _ => Layout::Nhwc,
        }
    }
}

pub struct OnnxAgeEstimator {
    session: ort::session::Session,
    layout: Layout,
}

impl OnnxAgeEstimator {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::load_session(model_path)?;
        let layout = Layout::from_input_dims(onnx_session::input_dims(&session));
        log::debug!("Age model input layout: {layout:?}");
        Ok(Self { session, layout })
    }
}

impl AgeEstimator for OnnxAgeEstimator {
    fn estimate(&mut self, photo: &Photo) -> Result<AgeEstimate, Box<dyn std::error::Error>> {
        let input_tensor = preprocess(photo, self.layout);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Age model produced no outputs".into());
        }

        let output = outputs[0].try_extract_array::<f32>()?;
        let raw = *output.iter().next().ok_or("Age model output is empty")?;
        let age = AgeEstimate::from_years(raw * AGE_SCALE);
        log::debug!("Estimated age: {age}");
        Ok(age)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Bilinear resize to `INPUT_SIZE`² and scale to [0,1] in the given layout.
fn preprocess(photo: &Photo, layout: Layout) -> ndarray::Array4<f32> {
    let resized = imageops::resize(
        &photo.to_rgb_image(),
        INPUT_SIZE,
        INPUT_SIZE,
        FilterType::Triangle,
    );
    let s = INPUT_SIZE as usize;
    let shape = match layout {
        Layout::Nhwc => (1, s, s, 3),
        Layout::Nchw => (1, 3, s, s),
    };

    let mut tensor = ndarray::Array4::<f32>::zeros(shape);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            match layout {
                Layout::Nhwc => tensor[[0, y, x, c]] = value,
                Layout::Nchw => tensor[[0, c, y, x]] = value,
            }
        }
    }
    tensor
}
