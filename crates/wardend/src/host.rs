//! The Unix host adapter for the service manager boundary.
//!
//! On a Unix host the "manager" delivering control codes is whatever
//! supervises the process: an init system, a session manager, an operator
//! with `kill`. [`SignalHost`] adapts that world to the
//! [`ServiceManager`] handshake: it installs a signal watcher that translates
//! incoming signals into control codes, records the pid for the registrar,
//! and persists every status report as a JSON snapshot other processes can
//! poll.
//!
//! Signal mapping: SIGTERM and SIGINT request Stop, SIGQUIT requests
//! Shutdown, SIGHUP interrogates, SIGUSR1 pauses, and SIGUSR2 continues.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::iterator::{Handle, Signals};

use warden_config::RuntimePaths;
use warden_control::{
    ManagerError, ServiceConnection, ServiceManager, StatusHandle, StructuredEventSink,
};
use warden_control_types::{ControlCode, StatusRecord};

const HOST_TARGET: &str = "wardend::host";

const WATCHED_SIGNALS: [i32; 6] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP, SIGUSR1, SIGUSR2];

/// Translates one delivered signal into a control code, if it maps.
pub(crate) const fn control_for_signal(signal: i32) -> Option<ControlCode> {
    match signal {
        SIGTERM | SIGINT => Some(ControlCode::Stop),
        SIGQUIT => Some(ControlCode::Shutdown),
        SIGHUP => Some(ControlCode::Interrogate),
        SIGUSR1 => Some(ControlCode::Pause),
        SIGUSR2 => Some(ControlCode::Continue),
        _ => None,
    }
}

/// Status snapshot persisted after every report.
///
/// The registrar polls this file during `remove` to observe the service
/// winding down; a missing file means the service is not running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StatusSnapshot {
    pub status: StatusRecord,
    pub pid: u32,
    pub timestamp: u64,
}

/// Production [`ServiceManager`] backed by Unix signals and snapshot files.
pub struct SignalHost {
    paths: RuntimePaths,
    watcher: Mutex<Option<Watcher>>,
}

struct Watcher {
    handle: Handle,
    pid_path: PathBuf,
    status_path: PathBuf,
}

impl SignalHost {
    /// Builds a host writing artefacts under the given runtime paths.
    #[must_use]
    pub fn new(paths: RuntimePaths) -> Self {
        Self {
            paths,
            watcher: Mutex::new(None),
        }
    }

    /// Stops watching signals and removes the runtime artefacts.
    ///
    /// Called once the dispatch loop has returned; failure to remove an
    /// artefact is logged, not escalated.
    pub fn teardown(&self) {
        let watcher = self
            .watcher
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        let Some(watcher) = watcher else {
            return;
        };
        watcher.handle.close();
        for path in [&watcher.pid_path, &watcher.status_path] {
            if let Err(error) = fs::remove_file(path)
                && error.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(
                    target: HOST_TARGET,
                    path = %path.display(),
                    %error,
                    "failed to remove runtime artefact"
                );
            }
        }
    }
}

impl ServiceManager for SignalHost {
    fn register(&self, name: &str) -> Result<ServiceConnection, ManagerError> {
        let handshake_failure = |reason: String| ManagerError::Handshake {
            service: name.to_owned(),
            reason,
        };

        let pid = process::id();
        let pid_path = self.paths.pid_path(name);
        let status_path = self.paths.status_path(name);
        fs::write(&pid_path, format!("{pid}\n"))
            .map_err(|error| handshake_failure(format!("failed to write pid file: {error}")))?;

        let mut signals = Signals::new(WATCHED_SIGNALS).map_err(|error| {
            handshake_failure(format!("failed to install signal handlers: {error}"))
        })?;
        let handle = signals.handle();

        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name("wardend-signals".to_owned())
            .spawn(move || {
                for signal in signals.forever() {
                    match control_for_signal(signal) {
                        Some(code) => {
                            tracing::info!(
                                target: HOST_TARGET,
                                signal,
                                control = %code,
                                "signal translated to control code"
                            );
                            if sender.send(code).is_err() {
                                break;
                            }
                        }
                        None => {
                            tracing::debug!(target: HOST_TARGET, signal, "ignoring signal");
                        }
                    }
                }
            })
            .map_err(|error| {
                handshake_failure(format!("failed to spawn signal watcher: {error}"))
            })?;

        *self
            .watcher
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Watcher {
            handle,
            pid_path,
            status_path: status_path.clone(),
        });

        Ok(ServiceConnection {
            controls: receiver,
            status: Box::new(FileStatusHandle {
                path: status_path,
                pid,
            }),
            events: Box::new(StructuredEventSink),
        })
    }
}

/// Status handle persisting each report as a JSON snapshot.
struct FileStatusHandle {
    path: PathBuf,
    pid: u32,
}

impl StatusHandle for FileStatusHandle {
    fn set_status(&mut self, record: &StatusRecord) -> Result<(), ManagerError> {
        let snapshot = StatusSnapshot {
            status: record.clone(),
            pid: self.pid,
            timestamp: unix_timestamp(),
        };
        let payload = serde_json::to_vec_pretty(&snapshot).map_err(|error| {
            ManagerError::StatusRejected {
                reason: format!("failed to encode status snapshot: {error}"),
            }
        })?;
        fs::write(&self.path, payload).map_err(|error| ManagerError::StatusRejected {
            reason: format!(
                "failed to write status snapshot '{}': {error}",
                self.path.display()
            ),
        })
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
