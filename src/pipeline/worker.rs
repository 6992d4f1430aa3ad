//! Background workers.
//!
//! A [`Worker`] runs one orchestrator invocation on its own thread and
//! streams its events back over a channel. Every run ends with exactly one
//! terminal event: the job's output, or its error message.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::error::{ChatminerError, Result};

/// Events a worker can emit.
pub trait WorkerEvent: Send + Sized + 'static {
    /// Payload of the successful terminal event.
    type Output: Send + 'static;

    /// Wraps a successful result.
    fn finished(output: Self::Output) -> Self;

    /// Wraps a failure message.
    fn failed(message: String) -> Self;

    /// Splits terminal events from progress: `Ok` carries the outcome of a
    /// terminal event, `Err` hands a progress event back.
    fn into_outcome(self) -> std::result::Result<std::result::Result<Self::Output, String>, Self>;
}

/// Handle to a running background job.
pub struct Worker<E: WorkerEvent> {
    handle: Option<JoinHandle<()>>,
    events: Receiver<E>,
}

impl<E: WorkerEvent> Worker<E> {
    /// Spawns `job` on a named thread.
    ///
    /// The job reports progress through the sender; its return value becomes
    /// the terminal event. A panicking job ends with a failure event.
    pub fn spawn<F>(name: &str, job: F) -> Result<Self>
    where
        F: FnOnce(&Sender<E>) -> Result<E::Output> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let thread_name = name.to_string();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let event = match panic::catch_unwind(AssertUnwindSafe(|| job(&tx))) {
                Ok(Ok(output)) => E::finished(output),
                Ok(Err(e)) => {
                    error!(worker = %thread_name, error = %e, "worker failed");
                    E::failed(e.to_string())
                }
                Err(payload) => {
                    let message = format!("worker panicked: {}", panic_message(&*payload));
                    error!(worker = %thread_name, "{message}");
                    E::failed(message)
                }
            };
            // The receiver may already be gone; nobody is left to tell.
            let _ = tx.send(event);
        })?;

        Ok(Self {
            handle: Some(handle),
            events: rx,
        })
    }

    /// Blocks for the next event. `None` once the worker is done.
    pub fn recv(&self) -> Option<E> {
        self.events.recv().ok()
    }

    /// Drains events until the terminal one, passing progress to `on_progress`.
    ///
    /// A failed run becomes [`ChatminerError::Worker`] carrying the job's
    /// error message verbatim.
    pub fn wait_with(mut self, mut on_progress: impl FnMut(E)) -> Result<E::Output> {
        while let Ok(event) = self.events.recv() {
            match event.into_outcome() {
                Ok(outcome) => {
                    self.join()?;
                    return outcome.map_err(ChatminerError::worker);
                }
                Err(progress) => on_progress(progress),
            }
        }
        self.join()?;
        Err(ChatminerError::worker("worker exited without a result"))
    }

    /// Waits for the terminal event, discarding progress.
    pub fn wait(self) -> Result<E::Output> {
        self.wait_with(|_| {})
    }

    fn join(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ChatminerError::worker("worker thread panicked")),
            None => Ok(()),
        }
    }
}

/// Text of a panic payload, when it carries one.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

impl<E: WorkerEvent> Iterator for Worker<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.events.recv().ok()
    }
}
