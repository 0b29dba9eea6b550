use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured,
    Cancelled,
}

/// A device or program that takes a photo and stores it at `target`.
///
/// `Err` means the camera could not be driven or failed; the user backing out
/// is `Ok(CaptureOutcome::Cancelled)`.
pub trait Camera: Send {
    fn capture(&mut self, target: &Path) -> std::io::Result<CaptureOutcome>;
}
