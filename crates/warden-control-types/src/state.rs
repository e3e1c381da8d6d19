use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle states reported to the host service manager.
///
/// Stable states:
/// - `Running`, `Paused`, `Stopped`
///
/// Pending (intermediate) states entered while a transition is in flight:
/// - `StartPending`, `StopPending`, `PausePending`, `ContinuePending`
///
/// A freshly constructed service is `StartPending`; `Stopped` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceState {
    StartPending,
    Running,
    StopPending,
    Stopped,
    PausePending,
    Paused,
    ContinuePending,
}

impl ServiceState {
    /// True while a transition is in flight and liveness checkpoints are
    /// expected by the manager.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::StartPending | Self::StopPending | Self::PausePending | Self::ContinuePending
        )
    }

    /// True for states a transition can settle in.
    #[must_use]
    pub const fn is_stable(self) -> bool {
        !self.is_pending()
    }

    /// Stable, human-readable label used in reports and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartPending => "start-pending",
            Self::Running => "running",
            Self::StopPending => "stop-pending",
            Self::Stopped => "stopped",
            Self::PausePending => "pause-pending",
            Self::Paused => "paused",
            Self::ContinuePending => "continue-pending",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Canonical list of all lifecycle states.
pub const ALL_STATES: [ServiceState; 7] = [
    ServiceState::StartPending,
    ServiceState::Running,
    ServiceState::StopPending,
    ServiceState::Stopped,
    ServiceState::PausePending,
    ServiceState::Paused,
    ServiceState::ContinuePending,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_stable_partition_the_states() {
        for state in ALL_STATES {
            assert_ne!(state.is_pending(), state.is_stable(), "state: {state}");
        }
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for state in ALL_STATES {
            let encoded = serde_json::to_string(&state).expect("state should encode");
            assert_eq!(encoded, format!("\"{}\"", state.label()));
        }
    }
}
