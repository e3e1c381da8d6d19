//! Status reporting with the liveness checkpoint counter.

use std::time::Duration;

use warden_control_types::{AcceptedControls, ServiceState, StatusRecord};

use crate::manager::{ManagerError, StatusHandle};

/// Formats and forwards status records to the manager.
///
/// Owns the single mutable checkpoint counter: reports entering `Running` or
/// `Stopped` reset it to zero, every other report carries the current value
/// and advances it, so consecutive pending reports are strictly increasing.
/// The accepted-control set is fixed at construction and stamped onto every
/// record unchanged.
pub struct StatusReporter {
    handle: Box<dyn StatusHandle>,
    accepted: AcceptedControls,
    checkpoint: u32,
}

impl StatusReporter {
    /// Builds a reporter over the manager's status handle.
    #[must_use]
    pub fn new(handle: Box<dyn StatusHandle>, accepted: AcceptedControls) -> Self {
        Self {
            handle,
            accepted,
            checkpoint: 0,
        }
    }

    /// Reports one state, applying the checkpoint rule.
    ///
    /// # Errors
    ///
    /// Propagates [`ManagerError`] when the manager rejects the report. The
    /// failure is fatal to the operation in progress and is not retried.
    pub fn report(
        &mut self,
        state: ServiceState,
        exit_code: u32,
        wait_hint: Duration,
    ) -> Result<(), ManagerError> {
        let checkpoint = if matches!(state, ServiceState::Running | ServiceState::Stopped) {
            self.checkpoint = 0;
            0
        } else {
            let current = self.checkpoint;
            self.checkpoint = self.checkpoint.wrapping_add(1);
            current
        };

        let record = StatusRecord {
            state,
            accepted: self.accepted,
            exit_code,
            checkpoint,
            wait_hint,
        };
        tracing::trace!(
            target: "warden_control::status",
            state = %record.state,
            exit_code = record.exit_code,
            checkpoint = record.checkpoint,
            "reporting status"
        );
        self.handle.set_status(&record)
    }
}
