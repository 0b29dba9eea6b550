use serde::Serialize;

use crate::classification::domain::age_estimator::AgeEstimate;
use crate::shared::face_region::FaceRegion;

/// Adult and kid counts for one classification run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub adults: u32,
    pub kids: u32,
}

impl Tally {
    /// Applies the single photo-wide estimate to every detected face.
    ///
    /// Starts from zero on every call; nothing carries over between runs.
    pub fn count(faces: &[FaceRegion], age: AgeEstimate) -> Self {
        let mut tally = Tally::default();
        for _face in faces {
            if age.is_adult() {
                tally.adults += 1;
            } else {
                tally.kids += 1;
            }
        }
        tally
    }

    pub fn total(&self) -> u32 {
        self.adults + self.kids
    }
}
