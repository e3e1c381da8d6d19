//! Boundary traits for the host service manager.
//!
//! The manager is the external subsystem that launches the process, delivers
//! control codes, and records reported status. The core never talks to it
//! directly; it goes through these traits so the daemon can plug in a real
//! host adapter and tests can plug in recording fakes.

use std::sync::mpsc::Receiver;

use thiserror::Error;

use warden_control_types::{ControlCode, Severity, StatusRecord};

/// Everything the handshake yields for one registered service.
///
/// The connection is the context token threaded through the rest of the
/// service's lifetime: the sequential control-code channel, the handle used
/// for status reports, and the event sink. The manager contract guarantees
/// codes are delivered one at a time, so a plain receiver models the dispatch
/// context faithfully.
pub struct ServiceConnection {
    pub controls: Receiver<ControlCode>,
    pub status: Box<dyn StatusHandle>,
    pub events: Box<dyn EventSink>,
}

/// The host service manager, as seen from a service process.
pub trait ServiceManager {
    /// Performs the one-time registration handshake for `name`.
    ///
    /// Success means the manager knows about this process and will deliver
    /// control codes over the returned connection. Failure here is distinct
    /// from any later transition failure.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Handshake`] when registration is refused.
    fn register(&self, name: &str) -> Result<ServiceConnection, ManagerError>;
}

/// Handle for forwarding status records to the manager.
pub trait StatusHandle {
    /// Reports one status record.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::StatusRejected`] when the manager refuses or
    /// drops the report. The caller treats this as fatal to the operation in
    /// progress and never retries; the manager owns the authoritative state
    /// once it is unreachable.
    fn set_status(&mut self, record: &StatusRecord) -> Result<(), ManagerError>;
}

/// Fire-and-forget diagnostic sink.
///
/// Failure to write is swallowed by implementations; a lost diagnostic must
/// never fail a transition.
pub trait EventSink {
    fn write(&self, message: &str, severity: Severity);
}

/// Errors raised at the manager boundary.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The registration handshake failed.
    #[error("registration handshake for service '{service}' failed: {reason}")]
    Handshake { service: String, reason: String },
    /// The manager rejected or dropped a status report.
    #[error("status report rejected by the manager: {reason}")]
    StatusRejected { reason: String },
    /// The control channel closed before the service reached Stopped.
    #[error("control channel disconnected before the service stopped")]
    Disconnected,
}

/// Event sink that records entries through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredEventSink;

impl EventSink for StructuredEventSink {
    fn write(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(target: "warden_control::events", message),
            Severity::Warning => tracing::warn!(target: "warden_control::events", message),
            Severity::Error => tracing::error!(target: "warden_control::events", message),
        }
    }
}
