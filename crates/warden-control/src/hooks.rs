//! The capability interface a concrete service implements.
//!
//! Each lifecycle transition invokes the matching hook synchronously on the
//! dispatch context. Hooks that can take meaningful time must arrange their
//! own asynchrony: `on_start` is expected to schedule background work and
//! return immediately, while `on_stop` is the one hook that legitimately
//! blocks, waiting out the worker's cancellation rendezvous.

use thiserror::Error;

use warden_control_types::EXIT_SUCCESS;

/// Outcome of a lifecycle hook.
pub type HookResult = Result<(), HookError>;

/// Failure reported by a lifecycle hook.
///
/// `Fault` carries an identifiable cause code that the controller logs and
/// reports to the manager as the exit code. `Unclassified` covers everything
/// else: logged with a generic message, reported with a success exit code,
/// same rollback.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed with cause code {code:#010x}")]
    Fault { code: u32 },
    #[error("{message}")]
    Unclassified { message: String },
}

impl HookError {
    /// Wraps an error whose cause the protocol cannot carry.
    pub fn unclassified(error: impl std::fmt::Display) -> Self {
        Self::Unclassified {
            message: error.to_string(),
        }
    }

    /// The cause code reported to the manager.
    #[must_use]
    pub const fn cause_code(&self) -> u32 {
        match self {
            Self::Fault { code } => *code,
            Self::Unclassified { .. } => EXIT_SUCCESS,
        }
    }
}

/// Lifecycle hooks supplied by the concrete service.
///
/// Every hook defaults to a no-op success, so a service overrides only the
/// transitions it cares about.
pub trait ServiceHooks {
    /// Runs when the manager starts the service. `args` are the start
    /// arguments forwarded by the host.
    fn on_start(&mut self, args: &[String]) -> HookResult {
        let _ = args;
        Ok(())
    }

    /// Runs when a Stop control is accepted. May block until background work
    /// has wound down.
    fn on_stop(&mut self) -> HookResult {
        Ok(())
    }

    /// Runs when a Pause control is accepted. Expected to return quickly.
    fn on_pause(&mut self) -> HookResult {
        Ok(())
    }

    /// Runs when a Continue control is accepted. Expected to return quickly.
    fn on_continue(&mut self) -> HookResult {
        Ok(())
    }

    /// Runs immediately before the system shuts the service down.
    fn on_shutdown(&mut self) -> HookResult {
        Ok(())
    }
}
