//! The lifecycle controller.
//!
//! Owns the current state, validates delivered control codes against the
//! declared capability set and the transition table, drives the per-transition
//! contract (report pending, invoke hook, report outcome), and rolls back to
//! the captured prior state when a hook fails.

use std::time::Duration;

use warden_control_types::{AcceptedControls, ControlCode, EXIT_SUCCESS, ServiceState, Severity};

use crate::hooks::{HookError, HookResult, ServiceHooks};
use crate::manager::{EventSink, ManagerError, StatusHandle};
use crate::state::{self, Transition};
use crate::status::StatusReporter;

const CONTROLLER_TARGET: &str = "warden_control::controller";

/// Drives lifecycle transitions for exactly one service.
///
/// The controller runs entirely on the dispatch context; the manager
/// guarantees sequential delivery, so no internal locking is needed. The
/// hooks are held behind the capability interface, never by concrete type.
pub struct LifecycleController {
    state: ServiceState,
    accepted: AcceptedControls,
    reporter: StatusReporter,
    events: Box<dyn EventSink>,
    hooks: Box<dyn ServiceHooks>,
    pending_wait_hint: Duration,
}

impl LifecycleController {
    /// Builds a controller in the initial `StartPending` state.
    #[must_use]
    pub fn new(
        hooks: Box<dyn ServiceHooks>,
        status: Box<dyn StatusHandle>,
        events: Box<dyn EventSink>,
        accepted: AcceptedControls,
        pending_wait_hint: Duration,
    ) -> Self {
        Self {
            state: ServiceState::StartPending,
            accepted,
            reporter: StatusReporter::new(status, accepted),
            events,
            hooks,
            pending_wait_hint,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ServiceState {
        self.state
    }

    /// Executes the Start transition issued by the dispatch bridge.
    ///
    /// # Errors
    ///
    /// Propagates [`ManagerError`] when a status report cannot reach the
    /// manager.
    pub fn start(&mut self, args: &[String]) -> Result<(), ManagerError> {
        self.run_transition(Transition::Start, args)
    }

    /// Dispatches one delivered control code.
    ///
    /// Codes outside the accepted set, vendor codes, and codes arriving in a
    /// state with no matching edge are ignored without invoking any hook.
    ///
    /// # Errors
    ///
    /// Propagates [`ManagerError`] when a status report cannot reach the
    /// manager.
    pub fn handle_control(&mut self, code: ControlCode) -> Result<(), ManagerError> {
        if !self.accepted.accepts(code) {
            tracing::debug!(
                target: CONTROLLER_TARGET,
                control = %code,
                "ignoring control outside the accepted set"
            );
            return Ok(());
        }
        match code {
            ControlCode::Stop => self.run_transition(Transition::Stop, &[]),
            ControlCode::Pause => self.run_transition(Transition::Pause, &[]),
            ControlCode::Continue => self.run_transition(Transition::Continue, &[]),
            ControlCode::Shutdown => self.run_transition(Transition::Shutdown, &[]),
            ControlCode::Interrogate => self.interrogate(),
            // accepts() filters vendor codes, but keep the arm total.
            ControlCode::Vendor(_) => Ok(()),
        }
    }

    /// Re-reports the current status without running any application logic.
    fn interrogate(&mut self) -> Result<(), ManagerError> {
        let wait_hint = if self.state.is_pending() {
            self.pending_wait_hint
        } else {
            Duration::ZERO
        };
        self.reporter.report(self.state, EXIT_SUCCESS, wait_hint)
    }

    /// The per-transition contract: report the pending state, invoke the
    /// hook synchronously, then report the terminal-for-this-transition
    /// state (the goal on success, the revert target on failure).
    fn run_transition(&mut self, via: Transition, args: &[String]) -> Result<(), ManagerError> {
        let prior = self.state;
        let pending = match state::begin(prior, via) {
            Ok(pending) => pending,
            Err(error) => {
                tracing::debug!(
                    target: CONTROLLER_TARGET,
                    %error,
                    "ignoring control with no edge from the current state"
                );
                return Ok(());
            }
        };

        if let Some(pending) = pending {
            self.state = pending;
            self.reporter
                .report(pending, EXIT_SUCCESS, self.pending_wait_hint)?;
        }

        match self.invoke_hook(via, args) {
            Ok(()) => {
                let goal = state::goal(via);
                self.state = goal;
                self.reporter.report(goal, EXIT_SUCCESS, Duration::ZERO)
            }
            Err(error) => {
                self.log_hook_failure(via, &error);
                let fallback = state::failure_state(via, prior);
                self.state = fallback;
                self.reporter
                    .report(fallback, error.cause_code(), Duration::ZERO)
            }
        }
    }

    fn invoke_hook(&mut self, via: Transition, args: &[String]) -> HookResult {
        match via {
            Transition::Start => self.hooks.on_start(args),
            Transition::Stop => self.hooks.on_stop(),
            Transition::Pause => self.hooks.on_pause(),
            Transition::Continue => self.hooks.on_continue(),
            Transition::Shutdown => self.hooks.on_shutdown(),
        }
    }

    fn log_hook_failure(&self, via: Transition, error: &HookError) {
        let message = match error {
            HookError::Fault { code } => {
                format!("service {via} failed with cause code {code:#010x}")
            }
            HookError::Unclassified { message } => {
                format!("service failed to {via}: {message}")
            }
        };
        self.events.write(&message, Severity::Error);
    }
}
