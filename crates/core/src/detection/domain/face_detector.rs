use crate::shared::face_region::FaceRegion;
use crate::shared::photo::Photo;

/// Domain interface for face detection.
///
/// Returns regions in detection order; an empty vector means no faces.
/// Backing models may need mutable state to run, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, photo: &Photo) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>>;
}
