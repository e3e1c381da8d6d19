//! Configuration for the warden service host.
//!
//! The daemon and the registrar both consume [`ServiceConfig`]: the service's
//! identity, the worker cadence, the stop-wait policy, and logging options.
//! Values come from compiled defaults, optionally overlaid by a JSON
//! configuration file. Runtime artefact paths (registry database, pid files,
//! status snapshots) are derived by [`RuntimePaths`] so every binary agrees
//! on the directory layout.

mod logging;
mod paths;
mod service;

pub use logging::LogFormat;
pub use paths::{RuntimePaths, RuntimePathsError, STATE_DIR_ENV};
pub use service::{
    ConfigError, ServiceConfig, ServiceIdentity, StopWaitPolicy, WorkerSettings,
};
