/// A detected face: axis-aligned box in photo pixel coordinates.
///
/// `confidence` is carried through from the detector for logging; the
/// adult/kid decision never looks at it.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: Option<f64>,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(self, confidence: f64) -> Self {
        Self {
            confidence: Some(confidence),
            ..self
        }
    }

    /// Builds a region from corner coordinates, clamped to the photo bounds.
    ///
    /// Returns `None` when nothing of the box is left inside the photo.
    pub fn from_corners_clamped(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        photo_width: u32,
        photo_height: u32,
    ) -> Option<Self> {
        let x1 = x1.max(0.0) as i32;
        let y1 = y1.max(0.0) as i32;
        let x2 = (x2.min(photo_width as f64)) as i32;
        let y2 = (y2.min(photo_height as f64)) as i32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self::new(x1, y1, x2 - x1, y2 - y1))
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }
}
