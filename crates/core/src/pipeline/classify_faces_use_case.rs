use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use crate::classification::domain::age_estimator::{AgeEstimate, AgeEstimator};
use crate::classification::domain::tally::Tally;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::model_gate::{GateError, ModelGate};
use crate::pipeline::output_surface::Notice;
use crate::shared::face_region::FaceRegion;
use crate::shared::photo::Photo;

/// Age model behind its readiness gate.
pub type AgeModelGate = ModelGate<Box<dyn AgeEstimator>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("face detection failed: {0}")]
    Detection(String),
    #[error("age estimation failed: {0}")]
    Classification(String),
    #[error("age model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("classification cancelled")]
    Cancelled,
}

impl From<GateError> for PipelineError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Failed(reason) => PipelineError::ModelUnavailable(reason),
            GateError::Cancelled => PipelineError::Cancelled,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    NoFaces,
    Tallied {
        tally: Tally,
        age: AgeEstimate,
        faces: Vec<FaceRegion>,
    },
}

/// Single-photo pipeline: detect → estimate age once → tally every face.
pub struct ClassifyFacesUseCase {
    detector: Box<dyn FaceDetector>,
    estimator: Arc<AgeModelGate>,
}

impl ClassifyFacesUseCase {
    pub fn new(detector: Box<dyn FaceDetector>, estimator: Arc<AgeModelGate>) -> Self {
        Self {
            detector,
            estimator,
        }
    }

    /// Runs detection and, if any faces were found, one age estimate.
    ///
    /// Notices go to `on_notice` as they arise: `NoFacesFound` ends the run,
    /// `MoreThanOneFace` is raised before estimation and changes nothing.
    /// On error no tally exists.
    pub fn execute(
        &mut self,
        photo: &Photo,
        cancelled: &AtomicBool,
        on_notice: &mut dyn FnMut(Notice),
    ) -> Result<Classification, PipelineError> {
        let faces = self
            .detector
            .detect(photo)
            .map_err(|e| PipelineError::Detection(e.to_string()))?;
        log::info!("Detected {} face(s)", faces.len());

        if faces.is_empty() {
            on_notice(Notice::NoFacesFound);
            return Ok(Classification::NoFaces);
        }
        if faces.len() > 1 {
            on_notice(Notice::MoreThanOneFace);
        }

        let age = self.estimator.with_ready(cancelled, |estimator| {
            estimator
                .estimate(photo)
                .map_err(|e| PipelineError::Classification(e.to_string()))
        })??;

        let tally = Tally::count(&faces, age);
        Ok(Classification::Tallied { tally, age, faces })
    }
}
