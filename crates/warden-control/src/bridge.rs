//! The control dispatch bridge.
//!
//! Connects one registered service to its controller: performs the
//! registration handshake, issues the initial Start transition, then forwards
//! every delivered control code until the controller reaches the terminal
//! state. The connection returned by the handshake is the context token for
//! the service's whole lifetime; there is no process-wide controller slot.

use std::sync::mpsc::Receiver;
use std::time::Duration;

use warden_control_types::{AcceptedControls, ControlCode, ServiceState};

use crate::controller::LifecycleController;
use crate::hooks::ServiceHooks;
use crate::manager::{ManagerError, ServiceManager};

const BRIDGE_TARGET: &str = "warden_control::bridge";

/// Forwards control codes from the manager to a single controller.
pub struct ControlDispatchBridge {
    service: String,
    controller: LifecycleController,
    controls: Receiver<ControlCode>,
}

impl ControlDispatchBridge {
    /// Performs the registration handshake and wires up the controller.
    ///
    /// A handshake failure is distinct from any later transition failure:
    /// nothing has been reported yet and no hook has run.
    ///
    /// # Errors
    ///
    /// Propagates [`ManagerError::Handshake`] from the manager.
    pub fn register(
        manager: &dyn ServiceManager,
        name: &str,
        hooks: Box<dyn ServiceHooks>,
        accepted: AcceptedControls,
        pending_wait_hint: Duration,
    ) -> Result<Self, ManagerError> {
        let connection = manager.register(name)?;
        tracing::info!(
            target: BRIDGE_TARGET,
            service = name,
            "registered with the service manager"
        );
        let controller = LifecycleController::new(
            hooks,
            connection.status,
            connection.events,
            accepted,
            pending_wait_hint,
        );
        Ok(Self {
            service: name.to_owned(),
            controller,
            controls: connection.controls,
        })
    }

    /// Runs the service until it stops.
    ///
    /// Issues the initial Start transition, then blocks on the control
    /// channel, forwarding each code to the controller. Returns once the
    /// controller reports `Stopped`; the process is expected to terminate
    /// when this call returns.
    ///
    /// # Errors
    ///
    /// Propagates [`ManagerError`] when a status report fails, or
    /// [`ManagerError::Disconnected`] when the manager tears the channel
    /// down before the service has stopped.
    pub fn run(mut self, args: &[String]) -> Result<(), ManagerError> {
        self.controller.start(args)?;
        if self.controller.state() == ServiceState::Stopped {
            // Start failed and has already been reported; nothing to
            // dispatch.
            return Ok(());
        }

        loop {
            let code = self
                .controls
                .recv()
                .map_err(|_disconnected| ManagerError::Disconnected)?;
            tracing::debug!(
                target: BRIDGE_TARGET,
                service = %self.service,
                control = %code,
                "dispatching control"
            );
            self.controller.handle_control(code)?;
            if self.controller.state() == ServiceState::Stopped {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use warden_control_types::{Severity, StatusRecord};

    use super::*;
    use crate::manager::{EventSink, ServiceConnection, StatusHandle};

    struct SilentStatus;
    impl StatusHandle for SilentStatus {
        fn set_status(&mut self, _record: &StatusRecord) -> Result<(), ManagerError> {
            Ok(())
        }
    }

    struct SilentEvents;
    impl EventSink for SilentEvents {
        fn write(&self, _message: &str, _severity: Severity) {}
    }

    struct NoHooks;
    impl ServiceHooks for NoHooks {}

    struct ScriptedManager {
        codes: Vec<ControlCode>,
    }

    impl ServiceManager for ScriptedManager {
        fn register(&self, _name: &str) -> Result<ServiceConnection, ManagerError> {
            let (sender, receiver) = mpsc::channel();
            for code in &self.codes {
                sender.send(*code).map_err(|_| ManagerError::Disconnected)?;
            }
            // Sender drops here; an undelivered stop surfaces as Disconnected.
            Ok(ServiceConnection {
                controls: receiver,
                status: Box::new(SilentStatus),
                events: Box::new(SilentEvents),
            })
        }
    }

    fn run_with(codes: Vec<ControlCode>) -> Result<(), ManagerError> {
        let manager = ScriptedManager { codes };
        let bridge = ControlDispatchBridge::register(
            &manager,
            "bridge-test",
            Box::new(NoHooks),
            AcceptedControls::default(),
            Duration::ZERO,
        )
        .expect("handshake should succeed");
        bridge.run(&[])
    }

    #[test]
    fn run_returns_once_stop_is_dispatched() {
        run_with(vec![ControlCode::Interrogate, ControlCode::Stop]).expect("service should stop");
    }

    #[test]
    fn shutdown_also_terminates_the_dispatch_loop() {
        run_with(vec![ControlCode::Shutdown]).expect("service should stop");
    }

    #[test]
    fn channel_teardown_before_stop_is_reported() {
        let error = run_with(vec![ControlCode::Interrogate]).expect_err("channel closes early");
        assert!(matches!(error, ManagerError::Disconnected));
    }

    #[test]
    fn handshake_failure_is_surfaced_before_any_dispatch() {
        struct RefusingManager;
        impl ServiceManager for RefusingManager {
            fn register(&self, name: &str) -> Result<ServiceConnection, ManagerError> {
                Err(ManagerError::Handshake {
                    service: name.to_owned(),
                    reason: "database unavailable".to_owned(),
                })
            }
        }

        let error = ControlDispatchBridge::register(
            &RefusingManager,
            "bridge-test",
            Box::new(NoHooks),
            AcceptedControls::default(),
            Duration::ZERO,
        )
        .map(|_| ())
        .expect_err("handshake should fail");
        assert!(matches!(error, ManagerError::Handshake { .. }));
    }
}
