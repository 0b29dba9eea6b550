use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::pipeline::classify_faces_use_case::{
    Classification, ClassifyFacesUseCase, PipelineError,
};
use crate::pipeline::output_surface::{ClassifiedPhoto, ClassifyMessage};
use crate::shared::photo::Photo;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a photo is already being classified")]
    Busy,
}

struct RunHandle {
    cancelled: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

/// Runs one classification at a time on a worker thread.
///
/// Each accepted photo gets its own message channel; the run ends with
/// exactly one final message (see [`ClassifyMessage::is_final`]).
pub struct ClassificationSession {
    use_case: Arc<Mutex<ClassifyFacesUseCase>>,
    in_flight: Arc<AtomicBool>,
    current: Option<RunHandle>,
}

impl ClassificationSession {
    pub fn new(use_case: ClassifyFacesUseCase) -> Self {
        Self {
            use_case: Arc::new(Mutex::new(use_case)),
            in_flight: Arc::new(AtomicBool::new(false)),
            current: None,
        }
    }

    /// Starts classifying `photo`, or rejects it while another run is pending.
    pub fn submit(&mut self, photo: Photo) -> Result<Receiver<ClassifyMessage>, SubmitError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Rejected photo: classification already in flight");
            return Err(SubmitError::Busy);
        }

        // The previous worker has already sent its final message.
        if let Some(previous) = self.current.take() {
            let _ = previous.worker.join();
        }

        let (tx, rx) = crossbeam_channel::unbounded::<ClassifyMessage>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let use_case = self.use_case.clone();
        let in_flight = self.in_flight.clone();
        let cancelled_clone = cancelled.clone();

        log::debug!("Classifying {}x{} photo", photo.width(), photo.height());
        let worker = thread::spawn(move || {
            let message = panic::catch_unwind(AssertUnwindSafe(|| {
                run(&use_case, photo, &cancelled_clone, &tx)
            }))
            .unwrap_or_else(|payload| {
                let reason = panic_reason(payload.as_ref());
                log::error!("Classification worker panicked: {reason}");
                ClassifyMessage::Error(format!("classification crashed: {reason}"))
            });
            in_flight.store(false, Ordering::Release);
            let _ = tx.send(message);
        });

        self.current = Some(RunHandle { cancelled, worker });
        Ok(rx)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Asks the current run to stop. It will finish with `Cancelled`.
    pub fn cancel(&self) {
        if let Some(run) = &self.current {
            run.cancelled.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for ClassificationSession {
    fn drop(&mut self) {
        if let Some(run) = self.current.take() {
            run.cancelled.store(true, Ordering::Relaxed);
            let _ = run.worker.join();
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run(
    use_case: &Mutex<ClassifyFacesUseCase>,
    photo: Photo,
    cancelled: &AtomicBool,
    tx: &Sender<ClassifyMessage>,
) -> ClassifyMessage {
    let result = {
        let mut use_case = use_case.lock().unwrap_or_else(PoisonError::into_inner);
        use_case.execute(&photo, cancelled, &mut |notice| {
            if !cancelled.load(Ordering::Relaxed) {
                let _ = tx.send(ClassifyMessage::Notice(notice));
            }
        })
    };

    if cancelled.load(Ordering::Relaxed) {
        log::info!("Classification cancelled");
        return ClassifyMessage::Cancelled;
    }

    match result {
        Ok(Classification::NoFaces) => ClassifyMessage::NoFaces,
        Ok(Classification::Tallied { tally, age, faces }) => {
            ClassifyMessage::Complete(ClassifiedPhoto {
                photo,
                tally,
                age,
                face_count: faces.len(),
            })
        }
        Err(PipelineError::Cancelled) => ClassifyMessage::Cancelled,
        Err(e) => {
            log::error!("Classification failed: {e}");
            ClassifyMessage::Error(e.to_string())
        }
    }
}
