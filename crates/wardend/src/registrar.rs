//! Registration glue against the manager database.
//!
//! The database is a JSON registry file in the state directory. `register`
//! and `unregister` are plain CRUD with idempotent failure reporting: a
//! duplicate or missing entry is an error for the caller to show, never an
//! escalation. `unregister` additionally requests Stop from a running
//! service and polls its status snapshot for a bounded number of attempts
//! before deleting the entry regardless.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_config::RuntimePaths;
use warden_control_types::ServiceState;

use crate::host::StatusSnapshot;

const REGISTRAR_TARGET: &str = "wardend::registrar";

const DEFAULT_STOP_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_STOP_POLL_ATTEMPTS: u32 = 10;

/// When the manager should start a registered service.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StartPolicy {
    /// Started automatically at boot.
    Auto,
    /// Started on demand.
    #[default]
    Demand,
    /// Registered but never started.
    Disabled,
}

/// One entry in the manager database.
///
/// Credentials never appear here: they are accepted at the call boundary
/// and discarded before anything is serialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub display_name: String,
    pub binary_path: PathBuf,
    pub start_policy: StartPolicy,
    pub dependencies: Vec<String>,
    pub account: String,
}

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// The registry file could not be read.
    #[error("failed to read registry '{path}': {source}")]
    ReadRegistry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The registry file is not valid JSON.
    #[error("failed to parse registry '{path}': {source}")]
    ParseRegistry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The registry file could not be written back.
    #[error("failed to persist registry '{path}': {source}")]
    PersistRegistry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A service with this name is already registered.
    #[error("service '{name}' is already registered")]
    AlreadyRegistered { name: String },
    /// No service with this name is registered.
    #[error("service '{name}' is not registered")]
    NotRegistered { name: String },
}

/// CRUD operations against the manager database.
pub struct Registrar {
    paths: RuntimePaths,
    stop_poll_interval: Duration,
    stop_poll_attempts: u32,
}

impl Registrar {
    /// Builds a registrar over the given runtime paths.
    #[must_use]
    pub fn new(paths: RuntimePaths) -> Self {
        Self {
            paths,
            stop_poll_interval: DEFAULT_STOP_POLL_INTERVAL,
            stop_poll_attempts: DEFAULT_STOP_POLL_ATTEMPTS,
        }
    }

    /// Overrides the stop-poll cadence. Used by tests.
    #[must_use]
    pub fn with_stop_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.stop_poll_interval = interval;
        self.stop_poll_attempts = attempts;
        self
    }

    /// Adds a service to the database.
    ///
    /// The credential, when supplied, is handed to the account subsystem and
    /// never written anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::AlreadyRegistered`] for duplicate names, or
    /// an IO/parse variant when the registry file is unusable.
    pub fn register(
        &self,
        definition: ServiceDefinition,
        credential: Option<&str>,
    ) -> Result<(), RegistrarError> {
        if credential.is_some() {
            tracing::debug!(
                target: REGISTRAR_TARGET,
                service = %definition.name,
                "credential supplied; forwarding to the account subsystem only"
            );
        }

        let mut registry = self.load_registry()?;
        if registry.contains_key(&definition.name) {
            return Err(RegistrarError::AlreadyRegistered {
                name: definition.name,
            });
        }
        tracing::info!(
            target: REGISTRAR_TARGET,
            service = %definition.name,
            binary = %definition.binary_path.display(),
            policy = %definition.start_policy,
            "registering service"
        );
        registry.insert(definition.name.clone(), definition);
        self.persist_registry(&registry)
    }

    /// Removes a service from the database, stopping it first if running.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::NotRegistered`] for unknown names, or an
    /// IO/parse variant when the registry file is unusable.
    pub fn unregister(&self, name: &str) -> Result<(), RegistrarError> {
        let mut registry = self.load_registry()?;
        if !registry.contains_key(name) {
            return Err(RegistrarError::NotRegistered {
                name: name.to_owned(),
            });
        }

        self.request_stop_and_wait(name);

        registry.remove(name);
        tracing::info!(target: REGISTRAR_TARGET, service = name, "service removed");
        self.persist_registry(&registry)
    }

    /// Sends a stop request to a running instance and polls until it reports
    /// Stopped or the attempt budget is spent. Deletion proceeds either way;
    /// an unstoppable service is logged, matching the database's
    /// idempotent-failure contract.
    fn request_stop_and_wait(&self, name: &str) {
        let Some(pid) = self.read_pid(name) else {
            tracing::debug!(target: REGISTRAR_TARGET, service = name, "service is not running");
            return;
        };

        tracing::info!(target: REGISTRAR_TARGET, service = name, pid, "requesting stop");
        if let Err(errno) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            tracing::warn!(
                target: REGISTRAR_TARGET,
                service = name,
                pid,
                %errno,
                "stop request could not be delivered"
            );
            return;
        }

        for _ in 0..self.stop_poll_attempts {
            thread::sleep(self.stop_poll_interval);
            if self.observed_stopped(name) {
                tracing::info!(target: REGISTRAR_TARGET, service = name, "service stopped");
                return;
            }
        }
        tracing::warn!(
            target: REGISTRAR_TARGET,
            service = name,
            "service did not stop within the poll budget; removing anyway"
        );
    }

    /// Whether the service's snapshot shows it stopped (or gone entirely).
    fn observed_stopped(&self, name: &str) -> bool {
        let status_path = self.paths.status_path(name);
        let Ok(content) = fs::read_to_string(&status_path) else {
            // No snapshot left behind means the process has torn down.
            return true;
        };
        match serde_json::from_str::<StatusSnapshot>(&content) {
            Ok(snapshot) => snapshot.status.state == ServiceState::Stopped,
            Err(error) => {
                tracing::debug!(
                    target: REGISTRAR_TARGET,
                    service = name,
                    %error,
                    "unreadable status snapshot; still waiting"
                );
                false
            }
        }
    }

    fn read_pid(&self, name: &str) -> Option<i32> {
        let pid_path = self.paths.pid_path(name);
        let content = fs::read_to_string(&pid_path).ok()?;
        match content.trim().parse() {
            Ok(pid) => Some(pid),
            Err(error) => {
                tracing::warn!(
                    target: REGISTRAR_TARGET,
                    path = %pid_path.display(),
                    %error,
                    "pid file is unreadable; treating service as not running"
                );
                None
            }
        }
    }

    fn load_registry(&self) -> Result<BTreeMap<String, ServiceDefinition>, RegistrarError> {
        let path = self.paths.registry_path();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(RegistrarError::ReadRegistry {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| RegistrarError::ParseRegistry {
            path: path.to_path_buf(),
            source,
        })
    }

    fn persist_registry(
        &self,
        registry: &BTreeMap<String, ServiceDefinition>,
    ) -> Result<(), RegistrarError> {
        let path = self.paths.registry_path();
        let payload = serde_json::to_vec_pretty(registry).map_err(|source| {
            RegistrarError::ParseRegistry {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, payload).map_err(|source| RegistrarError::PersistRegistry {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Builds the definition registered by `wardend install`.
#[must_use]
pub fn definition_for_current_binary(
    name: &str,
    display_name: &str,
    start_policy: StartPolicy,
    dependencies: Vec<String>,
    account: String,
) -> ServiceDefinition {
    let binary_path = std::env::current_exe().unwrap_or_else(|error| {
        tracing::warn!(
            target: REGISTRAR_TARGET,
            %error,
            "could not resolve the current executable path"
        );
        PathBuf::from("wardend")
    });
    ServiceDefinition {
        name: name.to_owned(),
        display_name: display_name.to_owned(),
        binary_path,
        start_policy,
        dependencies,
        account,
    }
}
