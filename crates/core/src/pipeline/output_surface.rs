use std::fmt;

use crate::classification::domain::age_estimator::AgeEstimate;
use crate::classification::domain::tally::Tally;
use crate::shared::photo::Photo;

/// User-facing notices raised while processing a photo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Detection found nothing. Must be acknowledged; ends the run.
    NoFacesFound,
    /// Advisory only; processing continues unchanged.
    MoreThanOneFace,
}

impl Notice {
    pub fn title(self) -> &'static str {
        match self {
            Notice::NoFacesFound => "No Faces Found",
            Notice::MoreThanOneFace => "More than 1 face",
        }
    }

    pub fn message(self) -> Option<&'static str> {
        match self {
            Notice::NoFacesFound => Some("Could not find any faces"),
            Notice::MoreThanOneFace => None,
        }
    }

    /// Whether the user has to dismiss it before continuing.
    pub fn is_blocking(self) -> bool {
        matches!(self, Notice::NoFacesFound)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {message}", self.title()),
            None => write!(f, "{}", self.title()),
        }
    }
}

/// Where results end up: two count fields, a photo view and a notice channel.
pub trait OutputSurface {
    fn show_counts(&mut self, adults: u32, kids: u32);

    fn show_photo(&mut self, photo: &Photo);

    fn notify(&mut self, notice: Notice);

    fn report_error(&mut self, message: &str);
}

/// A fully tallied photo, ready to publish.
#[derive(Clone, Debug)]
pub struct ClassifiedPhoto {
    pub photo: Photo,
    pub tally: Tally,
    pub age: AgeEstimate,
    pub face_count: usize,
}

/// Messages a classification run sends back to the front end.
#[derive(Debug)]
pub enum ClassifyMessage {
    Notice(Notice),
    Complete(ClassifiedPhoto),
    NoFaces,
    Error(String),
    Cancelled,
}

impl ClassifyMessage {
    /// Whether this is the last message of a run.
    pub fn is_final(&self) -> bool {
        !matches!(self, ClassifyMessage::Notice(_))
    }
}

/// Applies one message to the surface. Counts go out before the photo.
pub fn present(message: ClassifyMessage, surface: &mut dyn OutputSurface) {
    match message {
        ClassifyMessage::Notice(notice) => surface.notify(notice),
        ClassifyMessage::Complete(classified) => {
            log::info!(
                "Published {} adult(s), {} kid(s) for {} face(s) at {}",
                classified.tally.adults,
                classified.tally.kids,
                classified.face_count,
                classified.age
            );
            surface.show_counts(classified.tally.adults, classified.tally.kids);
            surface.show_photo(&classified.photo);
        }
        ClassifyMessage::Error(message) => surface.report_error(&message),
        ClassifyMessage::NoFaces | ClassifyMessage::Cancelled => {}
    }
}
