//! Core lifecycle control for warden services.
//!
//! This crate owns the part of a managed service with real invariants: the
//! lifecycle state machine, the controller that drives transitions and rolls
//! back on failure, the status reporter with its liveness checkpoint counter,
//! the worker coordinator with its cancellation rendezvous, and the dispatch
//! bridge that connects a [`manager::ServiceManager`] to a single controller.
//!
//! The manager itself (the host subsystem that launches processes, delivers
//! control codes, and records reported status) is an external collaborator
//! behind the traits in [`manager`]. Production code plugs in a host adapter
//! (see the `wardend` crate); tests plug in recording fakes.

mod bridge;
mod controller;
pub mod hooks;
pub mod manager;
mod state;
mod status;
mod worker;

pub use bridge::ControlDispatchBridge;
pub use controller::LifecycleController;
pub use hooks::{HookError, HookResult, ServiceHooks};
pub use manager::{
    EventSink, ManagerError, ServiceConnection, ServiceManager, StatusHandle, StructuredEventSink,
};
pub use state::{Transition, TransitionError};
pub use status::StatusReporter;
pub use worker::{WorkerCoordinator, WorkerSignals, WorkerSpawnError};
