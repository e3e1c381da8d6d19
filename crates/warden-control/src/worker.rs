//! The background worker and its cancellation rendezvous.
//!
//! A coordinator owns the only shared mutable state in the system: a
//! cancellation flag written by the controller side and read by the worker
//! loop, and a one-shot completion signal written by the worker and awaited
//! by the controller. The completion signal is a `Mutex<bool>` + `Condvar`
//! pair rather than a bare notification so a worker that finishes before the
//! controller begins waiting is still observed.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use thiserror::Error;

const WORKER_TARGET: &str = "warden_control::worker";

/// Cross-context signals shared between the controller and one worker.
#[derive(Debug, Default)]
pub struct WorkerSignals {
    stopping: AtomicBool,
    done: Mutex<bool>,
    completed: Condvar,
}

impl WorkerSignals {
    /// Asks the worker to wind down. Called from the controller side.
    pub fn request_stop(&self) {
        self.stopping.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested. Polled by the worker loop.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Records that the worker has exited. Signalled exactly once, by the
    /// coordinator's thread wrapper, after the worker body returns.
    fn mark_done(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done = true;
        self.completed.notify_all();
    }

    /// Blocks until the worker has exited, or until `timeout` elapses.
    ///
    /// Returns `true` once the completion signal is observed. `None` waits
    /// without bound; the caller hangs for as long as the worker does.
    #[must_use]
    pub fn wait_done(&self, timeout: Option<Duration>) -> bool {
        let done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        match timeout {
            None => {
                let done = self
                    .completed
                    .wait_while(done, |done| !*done)
                    .unwrap_or_else(PoisonError::into_inner);
                *done
            }
            Some(timeout) => {
                let (done, _result) = self
                    .completed
                    .wait_timeout_while(done, timeout, |done| !*done)
                    .unwrap_or_else(PoisonError::into_inner);
                *done
            }
        }
    }
}

/// Failure to schedule the worker thread.
#[derive(Debug, Error)]
#[error("failed to spawn worker thread '{name}': {source}")]
pub struct WorkerSpawnError {
    pub name: String,
    #[source]
    pub source: io::Error,
}

/// Schedules and rendezvouses with one unit of background work.
///
/// Exactly one coordinator exists per controller at a time: it is created
/// when Start is processed and dropped once Stop's rendezvous completes. The
/// worker thread is detached; the rendezvous is the completion signal, not
/// a join.
pub struct WorkerCoordinator {
    signals: Arc<WorkerSignals>,
}

impl WorkerCoordinator {
    /// Spawns `work` on its own named thread.
    ///
    /// The worker body receives the shared signals and is expected to poll
    /// [`WorkerSignals::is_stopping`] at a bounded interval; the completion
    /// signal fires once the body returns, whatever the reason.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerSpawnError`] when the thread cannot be created.
    pub fn spawn<F>(name: &str, work: F) -> Result<Self, WorkerSpawnError>
    where
        F: FnOnce(&WorkerSignals) + Send + 'static,
    {
        let signals = Arc::new(WorkerSignals::default());
        let worker_signals = Arc::clone(&signals);
        let thread_name = format!("{name}-worker");
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                work(&worker_signals);
                worker_signals.mark_done();
                tracing::debug!(target: WORKER_TARGET, "worker thread exited");
            })
            .map_err(|source| WorkerSpawnError {
                name: thread_name,
                source,
            })?;
        Ok(Self { signals })
    }

    /// Makes the cancellation request visible to the worker context.
    pub fn request_stop(&self) {
        self.signals.request_stop();
    }

    /// Blocks until the worker signals completion.
    ///
    /// Returns `false` when a bounded wait times out; the worker is then
    /// still running and the caller decides how to escalate.
    #[must_use]
    pub fn wait_for_exit(&self, timeout: Option<Duration>) -> bool {
        self.signals.wait_done(timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Instant;

    use super::*;

    #[test]
    fn cancellation_is_visible_to_the_worker_context() {
        let (observed_tx, observed_rx) = mpsc::channel();
        let coordinator = WorkerCoordinator::spawn("cancel-test", move |signals| {
            while !signals.is_stopping() {
                thread::sleep(Duration::from_millis(5));
            }
            observed_tx.send(()).expect("observer channel");
        })
        .expect("worker should spawn");

        coordinator.request_stop();
        observed_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("worker should observe cancellation");
        assert!(coordinator.wait_for_exit(Some(Duration::from_secs(2))));
    }

    #[test]
    fn completion_before_the_wait_is_still_observed() {
        let coordinator =
            WorkerCoordinator::spawn("early-exit", |signals| signals.request_stop())
                .expect("worker should spawn");

        // Give the worker time to finish before anyone waits.
        thread::sleep(Duration::from_millis(50));

        let waited = Instant::now();
        assert!(coordinator.wait_for_exit(None));
        assert!(
            waited.elapsed() < Duration::from_secs(1),
            "pre-signalled completion should return promptly"
        );
    }

    #[test]
    fn bounded_wait_reports_a_worker_that_will_not_exit() {
        let coordinator = WorkerCoordinator::spawn("stubborn", |signals| {
            // Ignores cancellation until well past the wait budget.
            let deadline = Instant::now() + Duration::from_millis(400);
            while Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            let _ = signals.is_stopping();
        })
        .expect("worker should spawn");

        coordinator.request_stop();
        assert!(!coordinator.wait_for_exit(Some(Duration::from_millis(50))));
        // The worker eventually exits and the signal is not lost.
        assert!(coordinator.wait_for_exit(Some(Duration::from_secs(2))));
    }
}
