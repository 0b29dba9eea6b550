use std::fmt;

use crate::shared::constants::ADULT_AGE_THRESHOLD;
use crate::shared::photo::Photo;

/// Estimated age in years for a whole photo.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize)]
#[serde(transparent)]
pub struct AgeEstimate(f32);

impl AgeEstimate {
    pub fn from_years(years: f32) -> Self {
        Self(years)
    }

    pub fn years(self) -> f32 {
        self.0
    }

    /// Inclusive: exactly 18.0 is an adult.
    pub fn is_adult(self) -> bool {
        self.0 >= ADULT_AGE_THRESHOLD
    }
}

impl fmt::Display for AgeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} years", self.0)
    }
}

/// Domain interface for age estimation.
///
/// Runs once per photo, never per face.
pub trait AgeEstimator: Send {
    fn estimate(&mut self, photo: &Photo) -> Result<AgeEstimate, Box<dyn std::error::Error>>;
}
