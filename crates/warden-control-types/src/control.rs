use std::fmt;

use serde::{Deserialize, Serialize};

/// Control codes delivered by the host service manager.
///
/// `Vendor` covers manager- or vendor-specific codes outside the standard
/// set; the controller ignores them. There is no Start code: the manager
/// starts a service by launching its process, not by delivering a code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlCode {
    Stop,
    Pause,
    Continue,
    Shutdown,
    Interrogate,
    Vendor(u32),
}

impl fmt::Display for ControlCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => formatter.write_str("stop"),
            Self::Pause => formatter.write_str("pause"),
            Self::Continue => formatter.write_str("continue"),
            Self::Shutdown => formatter.write_str("shutdown"),
            Self::Interrogate => formatter.write_str("interrogate"),
            Self::Vendor(code) => write!(formatter, "vendor({code})"),
        }
    }
}

/// Capability set declared when a service is constructed.
///
/// Fixed for the lifetime of the service; the controller consults it before
/// acting on a delivered control code and never mutates it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AcceptedControls {
    /// The service can be stopped.
    pub stop: bool,
    /// The service is notified when the system shuts down.
    pub shutdown: bool,
    /// The service can be paused and continued.
    pub pause_continue: bool,
}

impl AcceptedControls {
    /// Builds a capability set from its three flags.
    #[must_use]
    pub const fn new(stop: bool, shutdown: bool, pause_continue: bool) -> Self {
        Self {
            stop,
            shutdown,
            pause_continue,
        }
    }

    /// Whether the given control code is within this capability set.
    ///
    /// `Interrogate` is always accepted; vendor codes never are.
    #[must_use]
    pub const fn accepts(&self, code: ControlCode) -> bool {
        match code {
            ControlCode::Stop => self.stop,
            ControlCode::Shutdown => self.shutdown,
            ControlCode::Pause | ControlCode::Continue => self.pause_continue,
            ControlCode::Interrogate => true,
            ControlCode::Vendor(_) => false,
        }
    }
}

impl Default for AcceptedControls {
    /// The conventional default: stoppable, shutdown-aware, not pausable.
    fn default() -> Self {
        Self::new(true, true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrogate_is_always_accepted() {
        let none = AcceptedControls::new(false, false, false);
        assert!(none.accepts(ControlCode::Interrogate));
        assert!(!none.accepts(ControlCode::Stop));
        assert!(!none.accepts(ControlCode::Shutdown));
        assert!(!none.accepts(ControlCode::Pause));
    }

    #[test]
    fn vendor_codes_are_never_accepted() {
        let all = AcceptedControls::new(true, true, true);
        assert!(!all.accepts(ControlCode::Vendor(201)));
    }

    #[test]
    fn pause_and_continue_share_one_capability() {
        let pausable = AcceptedControls::new(true, true, true);
        assert!(pausable.accepts(ControlCode::Pause));
        assert!(pausable.accepts(ControlCode::Continue));
    }
}
