use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AcceptedControls, ServiceState};

/// Exit code reported alongside `Stopped`; zero means success.
pub const EXIT_SUCCESS: u32 = 0;

/// One status report forwarded to the host service manager.
///
/// A record is emitted after every state change and at least once per
/// transition's pending phase. `checkpoint` is the liveness counter described
/// in the protocol: it resets to zero exactly when a report enters `Running`
/// or `Stopped` and otherwise grows by one per report, so the manager can
/// tell a slow transition from a hung one. `wait_hint` estimates how long the
/// pending operation may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub state: ServiceState,
    pub accepted: AcceptedControls,
    pub exit_code: u32,
    pub checkpoint: u32,
    pub wait_hint: Duration,
}

impl StatusRecord {
    /// Initial record for a freshly constructed service.
    #[must_use]
    pub const fn initial(accepted: AcceptedControls) -> Self {
        Self {
            state: ServiceState::StartPending,
            accepted,
            exit_code: EXIT_SUCCESS,
            checkpoint: 0,
            wait_hint: Duration::ZERO,
        }
    }
}

/// Severity attached to entries written to the event sink.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => formatter.write_str("info"),
            Self::Warning => formatter.write_str("warning"),
            Self::Error => formatter.write_str("error"),
        }
    }
}
