//! The sample service: a periodic heartbeat.
//!
//! The heartbeat stands in for real application work. Start schedules the
//! worker thread and returns immediately; the worker logs a heartbeat line
//! every `heartbeat_interval` while sampling its cancellation flag every
//! `poll_interval`, so a stop request is honoured within one poll rather
//! than one heartbeat. Stop signals cancellation and blocks on the
//! completion rendezvous according to the configured wait policy.

use std::thread;
use std::time::Instant;

use warden_config::{StopWaitPolicy, WorkerSettings};
use warden_control::{HookError, HookResult, ServiceHooks, WorkerCoordinator, WorkerSignals};

const HEARTBEAT_TARGET: &str = "wardend::heartbeat";

/// Lifecycle hooks for the heartbeat service.
pub struct HeartbeatService {
    worker: WorkerSettings,
    stop_wait: StopWaitPolicy,
    coordinator: Option<WorkerCoordinator>,
}

impl HeartbeatService {
    /// Builds the service from its configuration sections.
    #[must_use]
    pub fn new(worker: WorkerSettings, stop_wait: StopWaitPolicy) -> Self {
        Self {
            worker,
            stop_wait,
            coordinator: None,
        }
    }
}

impl ServiceHooks for HeartbeatService {
    fn on_start(&mut self, _args: &[String]) -> HookResult {
        tracing::info!(target: HEARTBEAT_TARGET, "heartbeat service started");
        let settings = self.worker;
        let coordinator =
            WorkerCoordinator::spawn("heartbeat", move |signals| heartbeat_loop(signals, settings))
                .map_err(HookError::unclassified)?;
        self.coordinator = Some(coordinator);
        Ok(())
    }

    fn on_stop(&mut self) -> HookResult {
        tracing::info!(target: HEARTBEAT_TARGET, "heartbeat service stopping");
        let Some(coordinator) = self.coordinator.take() else {
            return Ok(());
        };
        coordinator.request_stop();
        if coordinator.wait_for_exit(self.stop_wait.timeout()) {
            return Ok(());
        }
        // Bounded wait expired: keep the coordinator so a retried stop can
        // rendezvous with the still-running worker.
        let timeout = self.stop_wait.timeout().unwrap_or_default();
        self.coordinator = Some(coordinator);
        Err(HookError::unclassified(format!(
            "worker did not exit within {} ms",
            timeout.as_millis()
        )))
    }
}

fn heartbeat_loop(signals: &WorkerSignals, settings: WorkerSettings) {
    while !signals.is_stopping() {
        tracing::info!(target: HEARTBEAT_TARGET, "service heartbeat");
        let due = Instant::now() + settings.heartbeat_interval();
        while !signals.is_stopping() {
            let remaining = due.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(settings.poll_interval()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn settings(heartbeat_ms: u64, poll_ms: u64) -> WorkerSettings {
        WorkerSettings {
            heartbeat_interval_ms: heartbeat_ms,
            poll_interval_ms: poll_ms,
        }
    }

    #[test]
    fn stop_is_honoured_within_the_poll_interval_not_the_heartbeat() {
        let mut service =
            HeartbeatService::new(settings(60_000, 10), StopWaitPolicy::Unbounded);
        service.on_start(&[]).expect("start should schedule");

        let stopping = Instant::now();
        service.on_stop().expect("stop should rendezvous");
        assert!(
            stopping.elapsed() < Duration::from_secs(5),
            "stop must not wait out the heartbeat interval"
        );
    }

    #[test]
    fn stop_without_a_running_worker_is_a_no_op() {
        let mut service = HeartbeatService::new(settings(1_000, 10), StopWaitPolicy::Unbounded);
        service.on_stop().expect("stop with no worker should succeed");
    }

    #[test]
    fn bounded_stop_escalates_then_recovers_on_retry() {
        let mut service = HeartbeatService::new(
            settings(60_000, 50),
            StopWaitPolicy::Bounded { timeout_ms: 1 },
        );
        service.on_start(&[]).expect("start should schedule");

        // A 1 ms budget is almost certainly too short for the first poll.
        if service.on_stop().is_err() {
            // The worker keeps winding down; a patient retry succeeds.
            service.stop_wait = StopWaitPolicy::Bounded { timeout_ms: 5_000 };
            service.on_stop().expect("retried stop should rendezvous");
        }
    }
}
