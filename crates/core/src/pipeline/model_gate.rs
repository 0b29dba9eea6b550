use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// How often a waiter re-checks its cancel flag.
const WAIT_SLICE: Duration = Duration::from_millis(100);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("model failed to initialize: {0}")]
    Failed(String),
    #[error("cancelled while waiting for model")]
    Cancelled,
}

enum GateState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

/// Readiness gate around a model that loads in the background.
///
/// The state is assigned exactly once (`Loading` → `Ready` or `Failed`).
/// Callers block in [`ModelGate::with_ready`] until then, so no inference
/// can start before initialization finishes.
pub struct ModelGate<T> {
    state: Mutex<GateState<T>>,
    ready: Condvar,
}

impl<T: Send + 'static> ModelGate<T> {
    /// Start loading on a background thread and return the gate immediately.
    pub fn spawn<F>(load: F) -> Arc<Self>
    where
        F: FnOnce() -> Result<T, String> + Send + 'static,
    {
        let gate = Arc::new(Self::loading());
        let loader = gate.clone();
        thread::spawn(move || loader.resolve(load()));
        gate
    }
}

impl<T> ModelGate<T> {
    pub fn loading() -> Self {
        Self {
            state: Mutex::new(GateState::Loading),
            ready: Condvar::new(),
        }
    }

    /// A gate that is already open.
    pub fn ready(model: T) -> Self {
        Self {
            state: Mutex::new(GateState::Ready(model)),
            ready: Condvar::new(),
        }
    }

    /// Records the load result. Later calls are ignored.
    pub fn resolve(&self, result: Result<T, String>) {
        let mut state = self.lock();
        if !matches!(*state, GateState::Loading) {
            log::warn!("Model gate already resolved; ignoring second result");
            return;
        }
        *state = match result {
            Ok(model) => {
                log::info!("Model ready");
                GateState::Ready(model)
            }
            Err(e) => {
                log::error!("Model failed to load: {e}");
                GateState::Failed(e)
            }
        };
        self.ready.notify_all();
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.lock(), GateState::Ready(_))
    }

    /// Waits for the model, then runs `f` with exclusive access to it.
    ///
    /// Returns early with [`GateError::Cancelled`] once `cancelled` is set,
    /// and with [`GateError::Failed`] if initialization failed.
    pub fn with_ready<R>(
        &self,
        cancelled: &AtomicBool,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, GateError> {
        let mut state = self.lock();
        loop {
            if cancelled.load(Ordering::Relaxed) {
                return Err(GateError::Cancelled);
            }
            match &mut *state {
                GateState::Ready(model) => return Ok(f(model)),
                GateState::Failed(e) => return Err(GateError::Failed(e.clone())),
                GateState::Loading => {
                    let (guard, _) = self
                        .ready
                        .wait_timeout(state, WAIT_SLICE)
                        .unwrap_or_else(PoisonError::into_inner);
                    state = guard;
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_ready_gate_runs_immediately() {
        let gate = ModelGate::ready(41);
        let result = gate.with_ready(&AtomicBool::new(false), |m| {
            *m += 1;
            *m
        });
        assert_eq!(result, Ok(42));
        assert!(gate.is_ready());
    }

    #[test]
    fn test_waits_until_loaded() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let gate = ModelGate::spawn(move || {
            release_rx.recv().unwrap();
            Ok("model")
        });
        assert!(!gate.is_ready());

        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.with_ready(&AtomicBool::new(false), |m| m.len()))
        };
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        assert_eq!(waiter.join().unwrap(), Ok(5));
        assert!(gate.is_ready());
    }

    #[test]
    fn test_failed_load_rejects_every_call() {
        let gate: ModelGate<u32> = ModelGate::loading();
        gate.resolve(Err("bad weights".into()));
        let cancelled = AtomicBool::new(false);

        for _ in 0..2 {
            let result = gate.with_ready(&cancelled, |_| ());
            assert_eq!(result, Err(GateError::Failed("bad weights".into())));
        }
        assert!(!gate.is_ready());
    }

    #[test]
    fn test_second_resolve_is_ignored() {
        let gate = ModelGate::loading();
        gate.resolve(Ok(1));
        gate.resolve(Ok(2));
        gate.resolve(Err("late".into()));
        assert_eq!(gate.with_ready(&AtomicBool::new(false), |m| *m), Ok(1));
    }

    #[test]
    fn test_cancel_while_loading() {
        let gate: Arc<ModelGate<u32>> = Arc::new(ModelGate::loading());
        let cancelled = Arc::new(AtomicBool::new(false));

        let waiter = {
            let gate = gate.clone();
            let cancelled = cancelled.clone();
            thread::spawn(move || gate.with_ready(&cancelled, |m| *m))
        };
        thread::sleep(Duration::from_millis(20));
        cancelled.store(true, Ordering::Relaxed);

        assert_eq!(waiter.join().unwrap(), Err(GateError::Cancelled));
    }
}
