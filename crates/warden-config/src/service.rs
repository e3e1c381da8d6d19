use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::LogFormat;

const DEFAULT_SERVICE_NAME: &str = "warden-sample";
const DEFAULT_DISPLAY_NAME: &str = "Warden Sample Service";
const DEFAULT_HEARTBEAT_MS: u64 = 50_000;
const DEFAULT_POLL_MS: u64 = 200;
const DEFAULT_WAIT_HINT_MS: u64 = 30_000;
const DEFAULT_LOG_FILTER: &str = "info";

/// Logical and displayed identity of the managed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Internal name registered with the manager database.
    pub name: String,
    /// Name shown to operators.
    pub display_name: String,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_owned(),
            display_name: DEFAULT_DISPLAY_NAME.to_owned(),
        }
    }
}

/// Cadence of the background worker.
///
/// The worker performs its periodic unit of work every `heartbeat_interval_ms`
/// but samples its cancellation flag every `poll_interval_ms`, so a stop
/// request is honoured within one poll interval rather than one heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub heartbeat_interval_ms: u64,
    pub poll_interval_ms: u64,
}

impl WorkerSettings {
    /// Interval between units of periodic work.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Interval between cancellation-flag samples.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_MS,
            poll_interval_ms: DEFAULT_POLL_MS,
        }
    }
}

/// How long the controller waits for the worker during a stop transition.
///
/// `Unbounded` preserves the classic behaviour: the stop request blocks until
/// the worker signals completion, however long that takes. `Bounded` trades
/// fidelity for responsiveness: when the timeout expires the stop is treated
/// as a failed transition (logged, state reverted) instead of hanging the
/// manager's request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StopWaitPolicy {
    #[default]
    Unbounded,
    Bounded { timeout_ms: u64 },
}

impl StopWaitPolicy {
    /// The wait budget, or `None` for an unbounded wait.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        match self {
            Self::Unbounded => None,
            Self::Bounded { timeout_ms } => Some(Duration::from_millis(*timeout_ms)),
        }
    }
}

/// Resolved configuration for the warden service host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub service: ServiceIdentity,
    pub worker: WorkerSettings,
    pub stop_wait: StopWaitPolicy,
    /// Wait hint attached to pending status reports, in milliseconds.
    pub pending_wait_hint_ms: u64,
    /// Tracing filter expression, e.g. `info` or `warden_control=debug`.
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Loads configuration from an optional JSON file on top of defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when the resulting values fail validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Wait hint attached to pending status reports.
    #[must_use]
    pub const fn pending_wait_hint(&self) -> Duration {
        Duration::from_millis(self.pending_wait_hint_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.name.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        if self.worker.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.worker.heartbeat_interval_ms < self.worker.poll_interval_ms {
            return Err(ConfigError::HeartbeatFasterThanPoll {
                heartbeat_ms: self.worker.heartbeat_interval_ms,
                poll_ms: self.worker.poll_interval_ms,
            });
        }
        if let StopWaitPolicy::Bounded { timeout_ms: 0 } = self.stop_wait {
            return Err(ConfigError::ZeroStopTimeout);
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service: ServiceIdentity::default(),
            worker: WorkerSettings::default(),
            stop_wait: StopWaitPolicy::default(),
            pending_wait_hint_ms: DEFAULT_WAIT_HINT_MS,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for [`ServiceConfig`].
    #[error("failed to parse configuration file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The service name is empty or blank.
    #[error("service name must not be empty")]
    EmptyServiceName,
    /// The worker poll interval is zero.
    #[error("worker poll interval must be greater than zero")]
    ZeroPollInterval,
    /// The heartbeat fires faster than the cancellation poll.
    #[error(
        "heartbeat interval ({heartbeat_ms} ms) must not be shorter than the poll interval ({poll_ms} ms)"
    )]
    HeartbeatFasterThanPoll { heartbeat_ms: u64, poll_ms: u64 },
    /// A bounded stop wait was configured with a zero timeout.
    #[error("bounded stop wait requires a timeout greater than zero")]
    ZeroStopTimeout,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn defaults_validate() {
        let config = ServiceConfig::load(None).expect("defaults should load");
        assert_eq!(config.service.name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.stop_wait, StopWaitPolicy::Unbounded);
        assert_eq!(config.worker.poll_interval(), Duration::from_millis(200));
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = NamedTempFile::new().expect("temp file should create");
        write!(
            file,
            r#"{{
                "service": {{ "name": "demo", "display_name": "Demo" }},
                "worker": {{ "heartbeat_interval_ms": 1000, "poll_interval_ms": 50 }},
                "stop_wait": {{ "mode": "bounded", "timeout_ms": 5000 }}
            }}"#
        )
        .expect("temp file should accept writes");
        let config = ServiceConfig::load(Some(file.path())).expect("file should load");
        assert_eq!(config.service.name, "demo");
        assert_eq!(
            config.stop_wait.timeout(),
            Some(Duration::from_millis(5000))
        );
        // Untouched sections keep their defaults.
        assert_eq!(config.pending_wait_hint_ms, DEFAULT_WAIT_HINT_MS);
    }

    #[rstest]
    #[case::empty_name(r#"{ "service": { "name": " ", "display_name": "x" } }"#)]
    #[case::zero_poll(r#"{ "worker": { "heartbeat_interval_ms": 1000, "poll_interval_ms": 0 } }"#)]
    #[case::heartbeat_faster(
        r#"{ "worker": { "heartbeat_interval_ms": 10, "poll_interval_ms": 100 } }"#
    )]
    #[case::zero_stop_timeout(r#"{ "stop_wait": { "mode": "bounded", "timeout_ms": 0 } }"#)]
    fn invalid_files_are_rejected(#[case] content: &str) {
        let mut file = NamedTempFile::new().expect("temp file should create");
        write!(file, "{content}").expect("temp file should accept writes");
        let error = ServiceConfig::load(Some(file.path()))
            .expect_err("invalid configuration should be rejected");
        assert!(
            !matches!(error, ConfigError::Read { .. } | ConfigError::Parse { .. }),
            "expected a validation error, got: {error}"
        );
    }

    #[test]
    fn missing_file_reports_read_error() {
        let error = ServiceConfig::load(Some(Path::new("/nonexistent/warden.json")))
            .expect_err("missing file should fail");
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
