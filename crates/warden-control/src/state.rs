//! The lifecycle transition table.
//!
//! Pure functions over [`ServiceState`]: which trigger is valid from which
//! state, which pending state a transition passes through, and where it lands
//! on success or failure. The controller layers reporting and hook invocation
//! on top; nothing here performs IO.

use std::fmt;

use thiserror::Error;

use warden_control_types::ServiceState;

/// Triggers that drive the state machine.
///
/// `Start` is issued once by the dispatch bridge after the registration
/// handshake; the remaining triggers correspond to delivered control codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transition {
    Start,
    Stop,
    Pause,
    Continue,
    Shutdown,
}

impl fmt::Display for Transition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => formatter.write_str("start"),
            Self::Stop => formatter.write_str("stop"),
            Self::Pause => formatter.write_str("pause"),
            Self::Continue => formatter.write_str("continue"),
            Self::Shutdown => formatter.write_str("shutdown"),
        }
    }
}

/// A trigger arrived in a state with no matching edge.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("transition '{via}' is not valid from state '{from}'")]
pub struct TransitionError {
    pub from: ServiceState,
    pub via: Transition,
}

/// Begins a transition, yielding the pending state to report.
///
/// Shutdown is the one trigger with no pending phase: the manager is tearing
/// the process down regardless, so the service moves straight to its final
/// report. All other triggers pass through the matching pending state.
///
/// # Errors
///
/// Returns [`TransitionError`] when `via` has no edge from `current`.
pub fn begin(
    current: ServiceState,
    via: Transition,
) -> Result<Option<ServiceState>, TransitionError> {
    use ServiceState as S;
    use Transition as T;

    let pending = match (current, via) {
        (S::StartPending, T::Start) => Some(S::StartPending),

        // Stop is honoured from Paused as well as Running; rollback restores
        // whichever state the transition began in.
        (S::Running | S::Paused, T::Stop) => Some(S::StopPending),

        (S::Running, T::Pause) => Some(S::PausePending),
        (S::Paused, T::Continue) => Some(S::ContinuePending),

        (current, T::Shutdown) if current != S::Stopped => None,

        _ => return Err(TransitionError { from: current, via }),
    };

    Ok(pending)
}

/// The stable state a successful transition settles in.
#[must_use]
pub const fn goal(via: Transition) -> ServiceState {
    match via {
        Transition::Start | Transition::Continue => ServiceState::Running,
        Transition::Pause => ServiceState::Paused,
        Transition::Stop | Transition::Shutdown => ServiceState::Stopped,
    }
}

/// The state a failed transition reverts to.
///
/// Start never ran, so there is nothing to fall back to but Stopped.
/// Shutdown is unconditional and ends Stopped even on failure. The remaining
/// triggers restore the state captured before the transition began.
#[must_use]
pub const fn failure_state(via: Transition, prior: ServiceState) -> ServiceState {
    match via {
        Transition::Start | Transition::Shutdown => ServiceState::Stopped,
        Transition::Stop | Transition::Pause | Transition::Continue => prior,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use super::Transition as T;
    use warden_control_types::ServiceState as S;

    #[rstest]
    #[case(S::StartPending, T::Start, Some(S::StartPending))]
    #[case(S::Running, T::Stop, Some(S::StopPending))]
    #[case(S::Paused, T::Stop, Some(S::StopPending))]
    #[case(S::Running, T::Pause, Some(S::PausePending))]
    #[case(S::Paused, T::Continue, Some(S::ContinuePending))]
    #[case(S::Running, T::Shutdown, None)]
    #[case(S::Paused, T::Shutdown, None)]
    #[case(S::StartPending, T::Shutdown, None)]
    fn valid_edges_yield_their_pending_state(
        #[case] from: S,
        #[case] via: T,
        #[case] expected: Option<S>,
    ) {
        assert_eq!(begin(from, via), Ok(expected));
    }

    #[rstest]
    #[case(S::Running, T::Start)]
    #[case(S::Stopped, T::Stop)]
    #[case(S::Stopped, T::Shutdown)]
    #[case(S::Paused, T::Pause)]
    #[case(S::Running, T::Continue)]
    #[case(S::StartPending, T::Stop)]
    fn missing_edges_are_rejected(#[case] from: S, #[case] via: T) {
        assert_eq!(begin(from, via), Err(TransitionError { from, via }));
    }

    #[rstest]
    #[case(T::Start, S::Running)]
    #[case(T::Stop, S::Stopped)]
    #[case(T::Pause, S::Paused)]
    #[case(T::Continue, S::Running)]
    #[case(T::Shutdown, S::Stopped)]
    fn goals_match_the_table(#[case] via: T, #[case] expected: S) {
        assert_eq!(goal(via), expected);
    }

    #[test]
    fn failure_restores_the_captured_prior_state() {
        assert_eq!(failure_state(T::Stop, S::Running), S::Running);
        assert_eq!(failure_state(T::Stop, S::Paused), S::Paused);
        assert_eq!(failure_state(T::Pause, S::Running), S::Running);
        assert_eq!(failure_state(T::Continue, S::Paused), S::Paused);
    }

    #[test]
    fn start_and_shutdown_failures_end_stopped() {
        assert_eq!(failure_state(T::Start, S::StartPending), S::Stopped);
        assert_eq!(failure_state(T::Shutdown, S::Running), S::Stopped);
    }
}
